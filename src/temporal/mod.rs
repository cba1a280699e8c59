//! Temporal module.
//!
//! Operations along the frame axis: temporal padding, windowing, crossfades
//! and duplicate skipping.

pub mod tpad;
pub mod window;
pub mod crossfade;
pub mod dups;

pub use tpad::{tpad, trim, TemporalExtent, TemporalPadMode, TrimSpec};
pub use window::{unwindow, window, UnwindowOptions, WindowPadding, WindowSpec};
pub use crossfade::{crossfade, fade_weights};
pub use dups::{skip_dups, DupHandle, MAX_SKIP};
