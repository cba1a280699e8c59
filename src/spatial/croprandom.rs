//! Fixed-size crops at a random position per frame.

use crate::core::clip::Clip;
use crate::core::error::{TileError, TileResult};
use crate::core::geometry::{check_alignment, TileRegion};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Multiplier spreading frame numbers across the seed space.
const FRAME_SEED_STEP: u64 = 0x9E37_79B1;

/// Crop every frame to `width x height` at a position drawn per frame.
///
/// The position of frame `n` only depends on `seed` and `n`, so repeated
/// calls return identical clips. Positions are aligned to the chroma
/// subsampling.
pub fn crop_random(clip: &Clip, width: u32, height: u32, seed: u64) -> TileResult<Clip> {
    if width == 0 || height == 0 {
        return Err(TileError::invalid("crop size", "crop width and height must be larger than 0"));
    }
    if width > clip.width() || height > clip.height() {
        return Err(TileError::invalid(
            "crop size",
            format!(
                "clip dimensions {}x{} can not be smaller than the crop {}x{}",
                clip.width(),
                clip.height(),
                width,
                height
            ),
        ));
    }
    let format = clip.format();
    let (sub_w, sub_h) = (format.sub_w(), format.sub_h());
    check_alignment(width as u64, sub_w, "Crop width", format)?;
    check_alignment(height as u64, sub_h, "Crop height", format)?;

    let (max_left, max_top) = (clip.width() - width, clip.height() - height);
    debug!(
        "Random {}x{} crops of {}x{} with seed {}",
        width,
        height,
        clip.width(),
        clip.height(),
        seed
    );
    let frames = clip
        .frames()
        .par_iter()
        .enumerate()
        .map(|(n, frame)| {
            let mut rng = StdRng::seed_from_u64(seed ^ (n as u64).wrapping_mul(FRAME_SEED_STEP));
            let left = rng.random_range(0..=max_left / sub_w) * sub_w;
            let top = rng.random_range(0..=max_top / sub_h) * sub_h;
            frame.crop_region(TileRegion::new(left, top, width, height))
        })
        .collect::<TileResult<Vec<_>>>()?;
    Clip::with_tags(frames, clip.tags.clone())
}
