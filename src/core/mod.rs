//! Core types for the Tileweave partitioning engine.
//!
//! This module contains the foundations shared by spatial and temporal
//! operations:
//! - Frame formats, frames and clips
//! - The integer geometry kernel
//! - Geometry records and their codec
//! - Masked merging
//! - Collaborator traits
//! - Error types

pub mod error;
pub mod format;
pub mod frame;
pub mod clip;
pub mod color;
pub mod geometry;
pub mod metadata;
pub mod merge;
pub mod collab;
pub mod convert;

// Re-export commonly used types
pub use error::{TileError, TileResult};
pub use format::{ColorFamily, FrameFormat, SampleType};
pub use frame::{Frame, Plane, PlaneData};
pub use clip::Clip;
pub use color::Color;
pub use geometry::{GridLayout, Margins, TileRegion, MAX_CHUNKS};
pub use metadata::{PadRecord, Record, Tags, TemporalPadRecord, TileRecord, WindowRecord};
pub use collab::{BorderDetect, BorderFill, Collaborators, FillMode, FrameDiff, Outpaint, OutpaintAlgorithm};
