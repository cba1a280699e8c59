//! Spatial module.
//!
//! Padding, cropping, tiling and the border helpers built on them.

pub mod pad;
pub mod tile;
pub mod autofill;
pub mod croprandom;

pub use pad::{align_to_modulus, crop, pad, CropMargins, ModPadding, PadMode, TilePadding};
pub use tile::{tile, untile, TileSpec, UntileOptions};
pub use autofill::{autofill, AutofillOptions};
pub use croprandom::crop_random;
