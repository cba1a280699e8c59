//! Planar frames and their geometric primitives.
//!
//! Frames are immutable. Planes are shared behind an `Arc` so cloning a
//! frame (which happens a lot when windows overlap or tiles repeat) never
//! copies pixel data. Every primitive here produces a new frame.

use crate::core::error::{TileError, TileResult};
use crate::core::format::{FrameFormat, SampleType};
use crate::core::geometry::{check_alignment, Margins, TileRegion};
use std::sync::Arc;

/// Sample storage of a single plane.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneData {
    /// Integer samples (8 to 16 bits)
    Int(Vec<u16>),
    /// Floating samples (half floats are widened)
    Float(Vec<f32>),
}

impl PlaneData {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            PlaneData::Int(v) => v.len(),
            PlaneData::Float(v) => v.len(),
        }
    }

    /// Check if the plane holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample representation of this storage.
    pub fn sample_type(&self) -> SampleType {
        match self {
            PlaneData::Int(_) => SampleType::Integer,
            PlaneData::Float(_) => SampleType::Float,
        }
    }
}

/// A single 2-D plane of samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: PlaneData,
}

fn crop_samples<T: Copy>(src: &[T], stride: usize, x: u32, y: u32, w: u32, h: u32) -> Vec<T> {
    let mut out = Vec::with_capacity(w as usize * h as usize);
    for row in y as usize..(y + h) as usize {
        let start = row * stride + x as usize;
        out.extend_from_slice(&src[start..start + w as usize]);
    }
    out
}

fn hstack_samples<T: Copy>(parts: &[(&[T], usize)], height: usize) -> Vec<T> {
    let total: usize = parts.iter().map(|(_, w)| w).sum();
    let mut out = Vec::with_capacity(total * height);
    for row in 0..height {
        for (samples, width) in parts {
            out.extend_from_slice(&samples[row * width..(row + 1) * width]);
        }
    }
    out
}

fn paste_samples<T: Copy>(dst: &mut [T], dst_stride: usize, src: &[T], src_w: usize, x: usize, y: usize) {
    for (row, chunk) in src.chunks(src_w).enumerate() {
        let start = (y + row) * dst_stride + x;
        dst[start..start + src_w].copy_from_slice(chunk);
    }
}

impl Plane {
    /// Create a plane, checking that the sample count matches the dimensions.
    pub fn new(width: u32, height: u32, data: PlaneData) -> TileResult<Self> {
        if data.len() != width as usize * height as usize {
            return Err(TileError::invalid(
                "plane",
                format!(
                    "{} samples do not fill a {}x{} plane",
                    data.len(),
                    width,
                    height
                ),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// Create a plane where every sample equals `value`.
    pub fn filled(width: u32, height: u32, sample_type: SampleType, value: f64) -> Self {
        let len = width as usize * height as usize;
        let data = match sample_type {
            SampleType::Integer => PlaneData::Int(vec![to_int_sample(value); len]),
            SampleType::Float => PlaneData::Float(vec![value as f32; len]),
        };
        Self { width, height, data }
    }

    /// Width in samples.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in samples.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw sample storage.
    pub fn data(&self) -> &PlaneData {
        &self.data
    }

    /// Read one sample as `f64`.
    pub fn get(&self, x: u32, y: u32) -> f64 {
        let index = y as usize * self.width as usize + x as usize;
        match &self.data {
            PlaneData::Int(v) => v[index] as f64,
            PlaneData::Float(v) => v[index] as f64,
        }
    }

    fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Plane {
        let stride = self.width as usize;
        let data = match &self.data {
            PlaneData::Int(v) => PlaneData::Int(crop_samples(v, stride, x, y, w, h)),
            PlaneData::Float(v) => PlaneData::Float(crop_samples(v, stride, x, y, w, h)),
        };
        Plane { width: w, height: h, data }
    }

    fn hstack(planes: &[&Plane]) -> TileResult<Plane> {
        let height = planes[0].height;
        let width = planes.iter().map(|p| p.width).sum();
        let data = match &planes[0].data {
            PlaneData::Int(_) => {
                let parts = planes
                    .iter()
                    .map(|p| match &p.data {
                        PlaneData::Int(v) => Ok((v.as_slice(), p.width as usize)),
                        PlaneData::Float(_) => Err(mixed_samples()),
                    })
                    .collect::<TileResult<Vec<_>>>()?;
                PlaneData::Int(hstack_samples(&parts, height as usize))
            }
            PlaneData::Float(_) => {
                let parts = planes
                    .iter()
                    .map(|p| match &p.data {
                        PlaneData::Float(v) => Ok((v.as_slice(), p.width as usize)),
                        PlaneData::Int(_) => Err(mixed_samples()),
                    })
                    .collect::<TileResult<Vec<_>>>()?;
                PlaneData::Float(hstack_samples(&parts, height as usize))
            }
        };
        Ok(Plane { width, height, data })
    }

    fn vstack(planes: &[&Plane]) -> TileResult<Plane> {
        let width = planes[0].width;
        let height = planes.iter().map(|p| p.height).sum();
        let data = match &planes[0].data {
            PlaneData::Int(_) => {
                let mut out = Vec::with_capacity(width as usize * height as usize);
                for plane in planes {
                    match &plane.data {
                        PlaneData::Int(v) => out.extend_from_slice(v),
                        PlaneData::Float(_) => return Err(mixed_samples()),
                    }
                }
                PlaneData::Int(out)
            }
            PlaneData::Float(_) => {
                let mut out = Vec::with_capacity(width as usize * height as usize);
                for plane in planes {
                    match &plane.data {
                        PlaneData::Float(v) => out.extend_from_slice(v),
                        PlaneData::Int(_) => return Err(mixed_samples()),
                    }
                }
                PlaneData::Float(out)
            }
        };
        Ok(Plane { width, height, data })
    }

    fn paste(&mut self, src: &Plane, x: u32, y: u32) -> TileResult<()> {
        let stride = self.width as usize;
        match (&mut self.data, &src.data) {
            (PlaneData::Int(dst), PlaneData::Int(s)) => {
                paste_samples(dst, stride, s, src.width as usize, x as usize, y as usize)
            }
            (PlaneData::Float(dst), PlaneData::Float(s)) => {
                paste_samples(dst, stride, s, src.width as usize, x as usize, y as usize)
            }
            _ => return Err(mixed_samples()),
        }
        Ok(())
    }
}

fn mixed_samples() -> TileError {
    TileError::invalid("planes", "integer and float planes can not be combined")
}

/// Round and clamp a value into integer sample range.
pub(crate) fn to_int_sample(value: f64) -> u16 {
    value.round().clamp(0.0, u16::MAX as f64) as u16
}

/// An immutable planar frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    format: FrameFormat,
    width: u32,
    height: u32,
    planes: Arc<[Plane]>,
}

impl Frame {
    /// Create a frame from planes, validating dimensions against the format.
    pub fn new(format: FrameFormat, width: u32, height: u32, planes: Vec<Plane>) -> TileResult<Self> {
        if width == 0 || height == 0 {
            return Err(TileError::invalid("frame", "frame dimensions must be non-zero"));
        }
        check_alignment(width as u64, format.sub_w(), "Frame width", &format)?;
        check_alignment(height as u64, format.sub_h(), "Frame height", &format)?;
        if planes.len() != format.num_planes() {
            return Err(TileError::invalid(
                "planes",
                format!("format {} needs {} planes, got {}", format, format.num_planes(), planes.len()),
            ));
        }
        for (index, plane) in planes.iter().enumerate() {
            let expected = format.plane_dimensions(index, width, height);
            if (plane.width, plane.height) != expected {
                return Err(TileError::invalid(
                    "planes",
                    format!(
                        "plane {} is {}x{}, expected {}x{}",
                        index, plane.width, plane.height, expected.0, expected.1
                    ),
                ));
            }
            if plane.data.sample_type() != format.sample_type {
                return Err(mixed_samples());
            }
        }
        Ok(Self {
            format,
            width,
            height,
            planes: planes.into(),
        })
    }

    /// Create a frame filled with one native value per plane.
    ///
    /// A single value is broadcast to all planes.
    pub fn blank(format: FrameFormat, width: u32, height: u32, values: &[f64]) -> TileResult<Self> {
        let planes = (0..format.num_planes())
            .map(|index| {
                let (w, h) = format.plane_dimensions(index, width, height);
                let value = values
                    .get(index)
                    .or_else(|| values.last())
                    .copied()
                    .unwrap_or(0.0);
                Plane::filled(w, h, format.sample_type, value)
            })
            .collect();
        Self::new(format, width, height, planes)
    }

    /// Create a frame filled with the format's black.
    pub fn black(format: FrameFormat, width: u32, height: u32) -> TileResult<Self> {
        Self::blank(format, width, height, &format.black())
    }

    /// Create a frame by evaluating `f(plane, x, y)` for every sample.
    pub fn from_fn<F>(format: FrameFormat, width: u32, height: u32, f: F) -> TileResult<Self>
    where
        F: Fn(usize, u32, u32) -> f64,
    {
        let planes = (0..format.num_planes())
            .map(|index| {
                let (w, h) = format.plane_dimensions(index, width, height);
                let samples = (0..h).flat_map(|y| (0..w).map(move |x| (x, y)));
                let data = match format.sample_type {
                    SampleType::Integer => {
                        PlaneData::Int(samples.map(|(x, y)| to_int_sample(f(index, x, y))).collect())
                    }
                    SampleType::Float => {
                        PlaneData::Float(samples.map(|(x, y)| f(index, x, y) as f32).collect())
                    }
                };
                Plane { width: w, height: h, data }
            })
            .collect();
        Self::new(format, width, height, planes)
    }

    /// Frame format.
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Width in luma pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in luma pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All planes.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// A single plane.
    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    /// Read one sample of one plane.
    pub fn get(&self, plane: usize, x: u32, y: u32) -> f64 {
        self.planes[plane].get(x, y)
    }

    /// Check that two frames share format and dimensions.
    pub fn same_geometry(&self, other: &Frame) -> bool {
        self.format == other.format && self.width == other.width && self.height == other.height
    }

    /// Crop an absolute region.
    pub fn crop_region(&self, region: TileRegion) -> TileResult<Frame> {
        let format = self.format;
        check_alignment(region.x as u64, format.sub_w(), "Crop left", &format)?;
        check_alignment(region.y as u64, format.sub_h(), "Crop top", &format)?;
        check_alignment(region.width as u64, format.sub_w(), "Crop width", &format)?;
        check_alignment(region.height as u64, format.sub_h(), "Crop height", &format)?;
        if region.width == 0 || region.height == 0 || !region.is_within_bounds(self.width, self.height) {
            return Err(TileError::CropExceedsFrame {
                left: region.x,
                right: self.width.saturating_sub(region.right()),
                top: region.y,
                bottom: self.height.saturating_sub(region.bottom()),
                width: self.width,
                height: self.height,
            });
        }
        if region.x == 0 && region.y == 0 && region.width == self.width && region.height == self.height {
            return Ok(self.clone());
        }

        let planes = self
            .planes
            .iter()
            .enumerate()
            .map(|(index, plane)| {
                if index == 0 {
                    plane.crop(region.x, region.y, region.width, region.height)
                } else {
                    plane.crop(
                        region.x >> format.subsampling_w,
                        region.y >> format.subsampling_h,
                        region.width >> format.subsampling_w,
                        region.height >> format.subsampling_h,
                    )
                }
            })
            .collect();
        Frame::new(format, region.width, region.height, planes)
    }

    /// Remove the given margins from each side.
    pub fn crop_margins(&self, margins: Margins) -> TileResult<Frame> {
        if margins.horizontal() >= self.width || margins.vertical() >= self.height {
            return Err(TileError::CropExceedsFrame {
                left: margins.left,
                right: margins.right,
                top: margins.top,
                bottom: margins.bottom,
                width: self.width,
                height: self.height,
            });
        }
        self.crop_region(TileRegion::new(
            margins.left,
            margins.top,
            self.width - margins.horizontal(),
            self.height - margins.vertical(),
        ))
    }

    /// Place frames side by side. All frames must share format and height.
    pub fn stack_horizontal(frames: &[Frame]) -> TileResult<Frame> {
        let first = frames
            .first()
            .ok_or_else(|| TileError::invalid("frames", "nothing to stack"))?;
        if frames.len() == 1 {
            return Ok(first.clone());
        }
        if frames
            .iter()
            .any(|f| f.format != first.format || f.height != first.height)
        {
            return Err(TileError::invalid(
                "frames",
                "horizontally stacked frames must share format and height",
            ));
        }
        let planes = (0..first.format.num_planes())
            .map(|index| {
                let parts: Vec<&Plane> = frames.iter().map(|f| f.plane(index)).collect();
                Plane::hstack(&parts)
            })
            .collect::<TileResult<Vec<_>>>()?;
        let width = frames.iter().map(|f| f.width).sum();
        Frame::new(first.format, width, first.height, planes)
    }

    /// Place frames on top of each other. All frames must share format and width.
    pub fn stack_vertical(frames: &[Frame]) -> TileResult<Frame> {
        let first = frames
            .first()
            .ok_or_else(|| TileError::invalid("frames", "nothing to stack"))?;
        if frames.len() == 1 {
            return Ok(first.clone());
        }
        if frames
            .iter()
            .any(|f| f.format != first.format || f.width != first.width)
        {
            return Err(TileError::invalid(
                "frames",
                "vertically stacked frames must share format and width",
            ));
        }
        let planes = (0..first.format.num_planes())
            .map(|index| {
                let parts: Vec<&Plane> = frames.iter().map(|f| f.plane(index)).collect();
                Plane::vstack(&parts)
            })
            .collect::<TileResult<Vec<_>>>()?;
        let height = frames.iter().map(|f| f.height).sum();
        Frame::new(first.format, first.width, height, planes)
    }

    /// Copy `src` into this frame with its top-left corner at (`left`, `top`).
    pub fn paste(&self, src: &Frame, left: u32, top: u32) -> TileResult<Frame> {
        let format = self.format;
        if src.format != format {
            return Err(TileError::invalid("src", "pasted frame must share the format"));
        }
        check_alignment(left as u64, format.sub_w(), "Paste left", &format)?;
        check_alignment(top as u64, format.sub_h(), "Paste top", &format)?;
        if left + src.width > self.width || top + src.height > self.height {
            return Err(TileError::invalid(
                "src",
                format!(
                    "{}x{} frame at ({}, {}) does not fit into {}x{}",
                    src.width, src.height, left, top, self.width, self.height
                ),
            ));
        }
        let mut planes = self.planes.to_vec();
        for (index, plane) in planes.iter_mut().enumerate() {
            let (x, y) = if index == 0 {
                (left, top)
            } else {
                (left >> format.subsampling_w, top >> format.subsampling_h)
            };
            plane.paste(src.plane(index), x, y)?;
        }
        Frame::new(format, self.width, self.height, planes)
    }

    /// Surround the frame with solid borders of native per-plane `values`.
    pub fn add_borders(&self, margins: Margins, values: &[f64]) -> TileResult<Frame> {
        if margins.is_zero() {
            return Ok(self.clone());
        }
        let (width, height) = margins.padded_size(self.width, self.height)?;
        let canvas = Frame::blank(self.format, width, height, values)?;
        canvas.paste(self, margins.left, margins.top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(format: FrameFormat, width: u32, height: u32) -> Frame {
        Frame::from_fn(format, width, height, |plane, x, y| {
            ((x + 3 * y + 50 * plane as u32) % 200) as f64
        })
        .unwrap()
    }

    #[test]
    fn test_new_rejects_unaligned_dimensions() {
        let result = Frame::black(FrameFormat::YUV420P8, 15, 16);
        assert!(matches!(result, Err(TileError::UnalignedValue { .. })));
    }

    #[test]
    fn test_crop_region_subsampled() {
        let frame = gradient(FrameFormat::YUV420P8, 16, 8);
        let cropped = frame.crop_region(TileRegion::new(4, 2, 8, 4)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (8, 4));
        assert_eq!(cropped.plane(1).width(), 4);
        assert_eq!(cropped.get(0, 0, 0), frame.get(0, 4, 2));
        assert_eq!(cropped.get(1, 1, 1), frame.get(1, 3, 2));
    }

    #[test]
    fn test_crop_region_rejects_unaligned_offset() {
        let frame = gradient(FrameFormat::YUV420P8, 16, 8);
        assert!(matches!(
            frame.crop_region(TileRegion::new(1, 0, 8, 4)),
            Err(TileError::UnalignedValue { .. })
        ));
    }

    #[test]
    fn test_stack_then_crop_recovers_parts() {
        let left = gradient(FrameFormat::RGB24, 6, 4);
        let right = Frame::blank(FrameFormat::RGB24, 3, 4, &[9.0]).unwrap();
        let row = Frame::stack_horizontal(&[left.clone(), right.clone()]).unwrap();
        assert_eq!(row.width(), 9);
        assert_eq!(row.crop_region(TileRegion::new(0, 0, 6, 4)).unwrap(), left);
        assert_eq!(row.crop_region(TileRegion::new(6, 0, 3, 4)).unwrap(), right);

        let column = Frame::stack_vertical(&[row.clone(), row.clone()]).unwrap();
        assert_eq!(column.height(), 8);
        assert_eq!(column.crop_region(TileRegion::new(0, 4, 9, 4)).unwrap(), row);
    }

    #[test]
    fn test_add_borders_then_crop_margins() {
        let frame = gradient(FrameFormat::YUV420P8, 8, 8);
        let margins = Margins::new(2, 4, 0, 2);
        let bordered = frame.add_borders(margins, &[16.0, 128.0, 128.0]).unwrap();
        assert_eq!((bordered.width(), bordered.height()), (14, 10));
        assert_eq!(bordered.get(0, 0, 0), 16.0);
        assert_eq!(bordered.get(2, 0, 0), 128.0);
        assert_eq!(bordered.crop_margins(margins).unwrap(), frame);
    }

    #[test]
    fn test_crop_margins_exceeding_frame() {
        let frame = gradient(FrameFormat::GRAY8, 8, 8);
        assert!(matches!(
            frame.crop_margins(Margins::new(4, 4, 0, 0)),
            Err(TileError::CropExceedsFrame { .. })
        ));
        assert!(matches!(
            frame.crop_margins(Margins::new(0, 0, 1, u32::MAX)),
            Err(TileError::CropExceedsFrame { .. })
        ));
    }

    #[test]
    fn test_add_borders_overflow() {
        let frame = gradient(FrameFormat::GRAY8, 8, 8);
        let error = frame.add_borders(Margins::new(u32::MAX, 1, 0, 0), &[0.0]).unwrap_err();
        assert_eq!(error.parameter(), Some("margins"));
    }
}
