//! # Tileweave - Reversible Tiling and Windowing
//!
//! Tileweave splits frame sequences into pieces small enough for expensive
//! per-piece processing and reassembles the processed pieces afterwards.
//! Every splitting operation records its geometry on the clip, so the
//! inverse operation can restore the original layout without being told how
//! the clip was cut.
//!
//! ## Features
//!
//! - **Spatial tiling**: Overlapping tiles in row-major order, with seams
//!   resolved by cropping or by a gradient blend
//! - **Temporal windowing**: Overlapping windows of frames, with the same
//!   crop-or-blend choice along time
//! - **Padding**: Mirror, repeat, wrap, solid colour and collaborator-based
//!   fills, all undone by an automatic crop
//! - **Crossfades** and **duplicate skipping** around costly processing
//! - **Parallel**: Frames and tiles are processed with rayon
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tileweave::prelude::*;
//!
//! let session = Session::new(collaborators);
//!
//! let tiles = session.tile(&clip, &TileSpec::new(256, 256).overlap(16))?;
//! let processed = upscale(&tiles);
//! let full = session.untile(&processed, &UntileOptions::new().fade(true))?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Frames, clips, geometry kernel, records, merging and errors
//! - [`spatial`]: Pad, crop, tile, untile, autofill and random crops
//! - [`temporal`]: Temporal padding, windows, crossfades and duplicate skipping
//! - [`session`]: Collaborator handles shared by all operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod session;
pub mod spatial;
pub mod temporal;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use tileweave::prelude::*;
/// ```
pub mod prelude {
    // Frames and clips
    pub use crate::core::{Clip, Color, ColorFamily, Frame, FrameFormat, Plane, PlaneData, SampleType};

    // Geometry and records
    pub use crate::core::{GridLayout, Margins, PadRecord, Tags, TemporalPadRecord, TileRecord, TileRegion, WindowRecord, MAX_CHUNKS};

    // Collaborators
    pub use crate::core::{BorderDetect, BorderFill, Collaborators, FillMode, FrameDiff, Outpaint, OutpaintAlgorithm};

    // Errors
    pub use crate::core::{TileError, TileResult};

    // Spatial
    pub use crate::spatial::{
        align_to_modulus, autofill, crop, crop_random, pad, tile, untile, AutofillOptions, CropMargins, ModPadding,
        PadMode, TilePadding, TileSpec, UntileOptions,
    };

    // Temporal
    pub use crate::temporal::{
        crossfade, fade_weights, skip_dups, tpad, trim, unwindow, window, DupHandle, TemporalExtent, TemporalPadMode,
        TrimSpec, UnwindowOptions, WindowPadding, WindowSpec, MAX_SKIP,
    };

    // Session
    pub use crate::session::Session;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::testing::{gradient_clip, test_collaborators};

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "tileweave");
    }

    #[test]
    fn test_prelude_round_trip() {
        let session = Session::new(test_collaborators());
        let clip = gradient_clip(FrameFormat::RGB24, 48, 40, 2);
        let tiles = session.tile(&clip, &TileSpec::new(24, 24).overlap(6)).unwrap();
        let full = session.untile(&tiles, &UntileOptions::new()).unwrap();
        assert_eq!(full.frames(), clip.frames());
    }
}
