//! Masked merging and blend masks.
//!
//! Masks are single-plane frames in the mask format of the blended frames
//! (same sample type and depth, gray, no subsampling). A mask value of 0
//! keeps the first frame, the format's peak takes the second.

use crate::core::error::{TileError, TileResult};
use crate::core::format::{ColorFamily, FrameFormat, SampleType};
use crate::core::frame::{Frame, Plane, PlaneData};
use image::imageops::interpolate_bilinear;
use image::{ImageBuffer, Luma};
use log::trace;
use std::collections::HashMap;

/// Direction a gradient ramp runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Ramp grows left to right
    Horizontal,
    /// Ramp grows top to bottom
    Vertical,
}

/// Blend `a` into `b` through `mask`.
///
/// Integer samples use `(a * (peak - m) + b * m + peak / 2) / peak`, float
/// samples `a * (1 - m) + b * m`. Subsampled chroma planes read the mask at
/// `(x << sw, y << sh)`.
pub fn masked_merge(a: &Frame, b: &Frame, mask: &Frame) -> TileResult<Frame> {
    let format = *a.format();
    if !a.same_geometry(b) {
        return Err(TileError::invalid(
            "frames",
            "merged frames must share format and dimensions",
        ));
    }
    if *mask.format() != format.mask_format() || mask.width() != a.width() || mask.height() != a.height() {
        return Err(TileError::invalid(
            "mask",
            format!(
                "mask must be {}x{} {}, got {}x{} {}",
                a.width(),
                a.height(),
                format.mask_format(),
                mask.width(),
                mask.height(),
                mask.format()
            ),
        ));
    }

    let mask_plane = mask.plane(0);
    let planes = (0..format.num_planes())
        .map(|index| {
            let (shift_w, shift_h) = if index > 0 && format.color_family == ColorFamily::Yuv {
                (format.subsampling_w, format.subsampling_h)
            } else {
                (0, 0)
            };
            merge_plane(a.plane(index), b.plane(index), mask_plane, shift_w, shift_h, &format)
        })
        .collect::<TileResult<Vec<_>>>()?;
    Frame::new(format, a.width(), a.height(), planes)
}

fn merge_plane(a: &Plane, b: &Plane, mask: &Plane, shift_w: u8, shift_h: u8, format: &FrameFormat) -> TileResult<Plane> {
    let (width, height) = (a.width(), a.height());
    let mask_width = mask.width() as usize;
    let mask_index = |x: u32, y: u32| ((y << shift_h) as usize) * mask_width + (x << shift_w) as usize;

    let data = match (a.data(), b.data(), mask.data()) {
        (PlaneData::Int(a), PlaneData::Int(b), PlaneData::Int(m)) => {
            let peak = format.peak() as u64;
            let half = peak / 2;
            let mut out = Vec::with_capacity(a.len());
            for y in 0..height {
                for x in 0..width {
                    let i = (y * width + x) as usize;
                    let w = (m[mask_index(x, y)] as u64).min(peak);
                    out.push(((a[i] as u64 * (peak - w) + b[i] as u64 * w + half) / peak) as u16);
                }
            }
            PlaneData::Int(out)
        }
        (PlaneData::Float(a), PlaneData::Float(b), PlaneData::Float(m)) => {
            let mut out = Vec::with_capacity(a.len());
            for y in 0..height {
                for x in 0..width {
                    let i = (y * width + x) as usize;
                    let w = m[mask_index(x, y)];
                    out.push(a[i] * (1.0 - w) + b[i] * w);
                }
            }
            PlaneData::Float(out)
        }
        _ => {
            return Err(TileError::invalid(
                "mask",
                "mask and frames must share the sample type",
            ))
        }
    };
    Plane::new(width, height, data)
}

/// Mask of a single constant weight in `[0, 1]`.
///
/// Integer masks hold `round(peak * weight)`.
pub fn uniform_mask(format: &FrameFormat, width: u32, height: u32, weight: f64) -> TileResult<Frame> {
    let mask_format = format.mask_format();
    let value = match mask_format.sample_type {
        SampleType::Integer => (mask_format.peak() * weight).round(),
        SampleType::Float => weight,
    };
    Frame::blank(mask_format, width, height, &[value])
}

/// Ramp values across an overlap of `overlap` samples.
///
/// A two-sample gradient from 0 to peak is resampled bilinearly so that
/// sample `j` takes `peak * (j + 0.5) / overlap`. Neither end is reached.
pub fn gradient_ramp(peak: f64, overlap: u32) -> TileResult<Vec<f64>> {
    let endpoints: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_raw(2, 1, vec![0.0, peak as f32])
        .ok_or_else(|| TileError::invalid("overlap", "could not build gradient endpoints"))?;
    (0..overlap)
        .map(|j| {
            let x = (j as f32 + 0.5) / overlap as f32;
            interpolate_bilinear(&endpoints, x, 0.0)
                .map(|pixel| pixel.0[0] as f64)
                .ok_or_else(|| TileError::invalid("overlap", format!("gradient sample {} out of range", x)))
        })
        .collect()
}

/// Gradient mask for an overlap region.
///
/// A horizontal mask is `overlap x extent` and ramps along x; a vertical
/// mask is `extent x overlap` and ramps along y.
pub fn gradient_mask(format: &FrameFormat, axis: Axis, overlap: u32, extent: u32) -> TileResult<Frame> {
    let mask_format = format.mask_format();
    let ramp = gradient_ramp(mask_format.peak(), overlap)?;
    match axis {
        Axis::Horizontal => Frame::from_fn(mask_format, overlap, extent, |_, x, _| ramp[x as usize]),
        Axis::Vertical => Frame::from_fn(mask_format, extent, overlap, |_, _, y| ramp[y as usize]),
    }
}

/// Gradient masks built once per size for the duration of one reconstruction.
#[derive(Debug)]
pub struct MaskCache {
    format: FrameFormat,
    masks: HashMap<(Axis, u32, u32), Frame>,
}

impl MaskCache {
    /// Create an empty cache for frames of `format`.
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            masks: HashMap::new(),
        }
    }

    /// Get or build the mask for `overlap` along `axis` spanning `extent`.
    pub fn get(&mut self, axis: Axis, overlap: u32, extent: u32) -> TileResult<&Frame> {
        let key = (axis, overlap, extent);
        if !self.masks.contains_key(&key) {
            trace!("Building {:?} gradient mask {} x {}", axis, overlap, extent);
            let mask = gradient_mask(&self.format, axis, overlap, extent)?;
            self.masks.insert(key, mask);
        }
        self.masks
            .get(&key)
            .ok_or_else(|| TileError::invalid("mask", "mask cache lost an entry"))
    }

    /// Read a mask built earlier by [`MaskCache::get`].
    pub fn lookup(&self, axis: Axis, overlap: u32, extent: u32) -> TileResult<&Frame> {
        self.masks.get(&(axis, overlap, extent)).ok_or_else(|| {
            TileError::invalid(
                "mask",
                format!("no {:?} mask of {} x {} was built", axis, overlap, extent),
            )
        })
    }

    /// Number of distinct masks built so far.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Check if no mask was built yet.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_is_open_interval() {
        let ramp = gradient_ramp(1.0, 4).unwrap();
        let expected = [0.125, 0.375, 0.625, 0.875];
        for (value, expected) in ramp.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_integer_gradient_mask() {
        let mask = gradient_mask(&FrameFormat::YUV420P8, Axis::Horizontal, 4, 2).unwrap();
        assert_eq!(*mask.format(), FrameFormat::GRAY8);
        assert_eq!((mask.width(), mask.height()), (4, 2));
        // 255 * [0.125, 0.375, 0.625, 0.875]
        let row: Vec<f64> = (0..4).map(|x| mask.get(0, x, 1)).collect();
        assert_eq!(row, vec![32.0, 96.0, 159.0, 223.0]);

        let vertical = gradient_mask(&FrameFormat::GRAY8, Axis::Vertical, 4, 3).unwrap();
        assert_eq!((vertical.width(), vertical.height()), (3, 4));
        assert_eq!(vertical.get(0, 2, 3), 223.0);
    }

    #[test]
    fn test_merge_extremes_and_midpoint() {
        let a = Frame::blank(FrameFormat::YUV420P8, 4, 4, &[10.0, 20.0, 30.0]).unwrap();
        let b = Frame::blank(FrameFormat::YUV420P8, 4, 4, &[110.0, 120.0, 130.0]).unwrap();

        let keep = uniform_mask(a.format(), 4, 4, 0.0).unwrap();
        assert_eq!(masked_merge(&a, &b, &keep).unwrap(), a);
        let take = uniform_mask(a.format(), 4, 4, 1.0).unwrap();
        assert_eq!(masked_merge(&a, &b, &take).unwrap(), b);

        // 255 * 0.4 = 102: (10 * 153 + 110 * 102 + 127) / 255 = 50
        let partial = uniform_mask(a.format(), 4, 4, 0.4).unwrap();
        let merged = masked_merge(&a, &b, &partial).unwrap();
        assert_eq!(merged.get(0, 0, 0), 50.0);
        assert_eq!(merged.get(2, 1, 1), 70.0);
    }

    #[test]
    fn test_merge_float() {
        let a = Frame::blank(FrameFormat::GRAYS, 2, 2, &[0.0]).unwrap();
        let b = Frame::blank(FrameFormat::GRAYS, 2, 2, &[1.0]).unwrap();
        let mask = uniform_mask(a.format(), 2, 2, 0.25).unwrap();
        assert_eq!(masked_merge(&a, &b, &mask).unwrap().get(0, 1, 1), 0.25);
    }

    #[test]
    fn test_merge_rejects_wrong_mask() {
        let a = Frame::black(FrameFormat::GRAY16, 4, 4).unwrap();
        let mask = uniform_mask(&FrameFormat::GRAY8, 4, 4, 0.5).unwrap();
        assert!(masked_merge(&a, &a, &mask).is_err());
    }

    #[test]
    fn test_mask_cache_reuses_sizes() {
        let mut cache = MaskCache::new(FrameFormat::RGB24);
        cache.get(Axis::Horizontal, 8, 16).unwrap();
        cache.get(Axis::Horizontal, 8, 16).unwrap();
        cache.get(Axis::Vertical, 8, 16).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(Axis::Vertical, 8, 16).is_ok());
        assert!(cache.lookup(Axis::Vertical, 4, 16).is_err());
    }
}
