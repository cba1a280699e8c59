//! Crossfading between two clips.

use crate::core::clip::Clip;
use crate::core::error::{TileError, TileResult};
use crate::core::frame::Frame;
use crate::core::merge::{masked_merge, uniform_mask};
use log::debug;
use rayon::prelude::*;

/// Blend weights of a crossfade over `length` frames.
///
/// Weight `i` is `(i + 1) / (length + 1)`, so neither the first nor the last
/// blended frame is a pure copy of either clip.
pub fn fade_weights(length: usize) -> Vec<f64> {
    (0..length).map(|i| (i + 1) as f64 / (length + 1) as f64).collect()
}

/// Fade the last `length` frames of `a` into the first `length` frames of `b`.
///
/// A length of 0 splices the clips. The result carries the tags of `a`.
pub fn crossfade(a: &Clip, b: &Clip, length: usize) -> TileResult<Clip> {
    if !a.same_geometry(b) {
        return Err(TileError::invalid(
            "clips",
            format!(
                "both clips must have the same format and dimensions, got {} {}x{} and {} {}x{}",
                a.format(),
                a.width(),
                a.height(),
                b.format(),
                b.width(),
                b.height()
            ),
        ));
    }
    if length == 0 {
        return Clip::concat(&[a.clone(), b.clone()]);
    }
    if length > a.len() || length > b.len() {
        return Err(TileError::invalid(
            "length",
            format!(
                "crossfade of {} frames needs clips of at least that length, got {} and {}",
                length,
                a.len(),
                b.len()
            ),
        ));
    }
    debug!("Crossfading {} + {} frames over {}", a.len(), b.len(), length);
    let frames = crossfade_frames(a.frames(), b.frames(), length)?;
    Clip::with_tags(frames, a.tags.clone())
}

/// Crossfade on plain frame lists. `length` must not exceed either list.
pub(crate) fn crossfade_frames(a: &[Frame], b: &[Frame], length: usize) -> TileResult<Vec<Frame>> {
    let keep_a = a.len() - length;
    let template = &a[keep_a];
    let format = *template.format();
    let (width, height) = (template.width(), template.height());

    let blended = fade_weights(length)
        .into_par_iter()
        .zip(a[keep_a..].par_iter().zip(&b[..length]))
        .map(|(weight, (from, to))| {
            let mask = uniform_mask(&format, width, height, weight)?;
            masked_merge(from, to, &mask)
        })
        .collect::<TileResult<Vec<_>>>()?;

    let mut frames = Vec::with_capacity(a.len() + b.len() - length);
    frames.extend_from_slice(&a[..keep_a]);
    frames.extend(blended);
    frames.extend_from_slice(&b[length..]);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::FrameFormat;
    use crate::testing::{frame_ids, numbered_clip};

    fn solid(format: FrameFormat, value: f64, length: usize) -> Clip {
        Clip::repeat_frame(Frame::blank(format, 4, 4, &[value]).unwrap(), length).unwrap()
    }

    #[test]
    fn test_weights_are_strictly_inside() {
        let weights = fade_weights(3);
        assert_eq!(weights, vec![0.25, 0.5, 0.75]);
        assert!(weights.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(weights.iter().all(|w| *w > 0.0 && *w < 1.0));
    }

    #[test]
    fn test_zero_length_is_concat() {
        let a = numbered_clip(FrameFormat::GRAY8, 3);
        let b = numbered_clip(FrameFormat::GRAY8, 2);
        let faded = crossfade(&a, &b, 0).unwrap();
        assert_eq!(faded, Clip::concat(&[a, b]).unwrap());
    }

    #[test]
    fn test_integer_fade_levels() {
        let a = solid(FrameFormat::GRAY8, 0.0, 4);
        let b = solid(FrameFormat::GRAY8, 255.0, 4);
        let faded = crossfade(&a, &b, 3).unwrap();
        assert_eq!(faded.len(), 5);
        // round(255 * [0.25, 0.5, 0.75])
        assert_eq!(frame_ids(&faded), vec![0, 64, 128, 191, 255]);
    }

    #[test]
    fn test_float_fade_levels() {
        let a = solid(FrameFormat::GRAYS, 0.0, 2);
        let b = solid(FrameFormat::GRAYS, 1.0, 2);
        let faded = crossfade(&a, &b, 1).unwrap();
        assert_eq!(faded.frames()[1].get(0, 2, 2), 0.5);
    }

    #[test]
    fn test_fade_of_whole_clips() {
        let a = solid(FrameFormat::YUV420P8, 20.0, 2);
        let b = solid(FrameFormat::YUV420P8, 20.0, 2);
        let faded = crossfade(&a, &b, 2).unwrap();
        assert_eq!(faded.len(), 2);
        assert_eq!(faded.frames()[0], a.frames()[0]);
    }

    #[test]
    fn test_rejections() {
        let a = solid(FrameFormat::GRAY8, 0.0, 2);
        let b = solid(FrameFormat::GRAY16, 0.0, 2);
        assert!(crossfade(&a, &b, 1).is_err());
        assert!(crossfade(&a, &a, 3).is_err());
    }
}
