//! Conversion between [`Frame`] and `image::DynamicImage`.
//!
//! Only packed gray and RGB images map onto planar frames without a colour
//! matrix, so YUV frames are rejected. Alpha channels are dropped.

use crate::core::error::{TileError, TileResult};
use crate::core::format::{ColorFamily, FrameFormat, SampleType};
use crate::core::frame::{Frame, Plane, PlaneData};
use image::{DynamicImage, ImageBuffer, Luma, Rgb};

fn deinterleave<T: Copy>(samples: &[T], channels: usize) -> Vec<Vec<T>> {
    (0..channels)
        .map(|c| samples.iter().skip(c).step_by(channels).copied().collect())
        .collect()
}

fn interleave<T: Copy>(planes: &[&[T]]) -> Vec<T> {
    let len = planes.first().map_or(0, |p| p.len());
    let mut out = Vec::with_capacity(len * planes.len());
    for i in 0..len {
        out.extend(planes.iter().map(|p| p[i]));
    }
    out
}

fn build(format: FrameFormat, width: u32, height: u32, planes: Vec<PlaneData>) -> TileResult<Frame> {
    let planes = planes
        .into_iter()
        .map(|data| Plane::new(width, height, data))
        .collect::<TileResult<Vec<_>>>()?;
    Frame::new(format, width, height, planes)
}

fn int_planes(frame: &Frame) -> TileResult<Vec<&[u16]>> {
    frame
        .planes()
        .iter()
        .map(|p| match p.data() {
            PlaneData::Int(v) => Ok(v.as_slice()),
            PlaneData::Float(_) => Err(TileError::invalid("frame", "expected integer samples")),
        })
        .collect()
}

fn float_planes(frame: &Frame) -> TileResult<Vec<&[f32]>> {
    frame
        .planes()
        .iter()
        .map(|p| match p.data() {
            PlaneData::Float(v) => Ok(v.as_slice()),
            PlaneData::Int(_) => Err(TileError::invalid("frame", "expected float samples")),
        })
        .collect()
}

impl Frame {
    /// Convert a decoded image into a planar frame.
    ///
    /// 8-bit images become `GRAY8`/`RGB24`, 16-bit images `GRAY16`/`RGB48`
    /// and float images `RGBS`.
    pub fn from_dynamic_image(image: &DynamicImage) -> TileResult<Frame> {
        let (width, height) = (image.width(), image.height());
        let widen = |v: Vec<u8>| PlaneData::Int(v.into_iter().map(u16::from).collect());
        match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
                let gray = image.to_luma8().into_raw();
                build(FrameFormat::GRAY8, width, height, vec![widen(gray)])
            }
            DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
                let gray = image.to_luma16().into_raw();
                build(FrameFormat::GRAY16, width, height, vec![PlaneData::Int(gray)])
            }
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
                let planes = deinterleave(&image.to_rgb16().into_raw(), 3)
                    .into_iter()
                    .map(PlaneData::Int)
                    .collect();
                build(FrameFormat::RGB48, width, height, planes)
            }
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                let planes = deinterleave(&image.to_rgb32f().into_raw(), 3)
                    .into_iter()
                    .map(PlaneData::Float)
                    .collect();
                build(FrameFormat::RGBS, width, height, planes)
            }
            _ => {
                let planes = deinterleave(&image.to_rgb8().into_raw(), 3)
                    .into_iter()
                    .map(widen)
                    .collect();
                build(FrameFormat::RGB24, width, height, planes)
            }
        }
    }

    /// Convert a gray or RGB frame into an image.
    ///
    /// Integer frames above 8 bits are scaled to 16 bits.
    pub fn to_dynamic_image(&self) -> TileResult<DynamicImage> {
        let format = self.format();
        let (width, height) = (self.width(), self.height());
        let unsupported = || {
            TileError::invalid(
                "frame",
                format!("format {} has no matching image layout", format),
            )
        };
        if format.color_family == ColorFamily::Yuv {
            return Err(unsupported());
        }
        let gray = format.color_family == ColorFamily::Gray;

        match format.sample_type {
            SampleType::Integer if format.bits_per_sample == 8 => {
                let planes = int_planes(self)?;
                let samples: Vec<u8> = interleave(&planes).into_iter().map(|v| v.min(255) as u8).collect();
                let image = if gray {
                    ImageBuffer::<Luma<u8>, _>::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
                } else {
                    ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
                };
                image.ok_or_else(unsupported)
            }
            SampleType::Integer => {
                let shift = 16 - format.bits_per_sample as u32;
                let planes = int_planes(self)?;
                let samples: Vec<u16> = interleave(&planes).into_iter().map(|v| v << shift).collect();
                let image = if gray {
                    ImageBuffer::<Luma<u16>, _>::from_raw(width, height, samples).map(DynamicImage::ImageLuma16)
                } else {
                    ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, samples).map(DynamicImage::ImageRgb16)
                };
                image.ok_or_else(unsupported)
            }
            SampleType::Float => {
                let planes = float_planes(self)?;
                let planes = if gray { vec![planes[0]; 3] } else { planes };
                ImageBuffer::<Rgb<f32>, _>::from_raw(width, height, interleave(&planes))
                    .map(DynamicImage::ImageRgb32F)
                    .ok_or_else(unsupported)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_rgb8_image_to_planes() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([10, 20, 30]));
        let frame = Frame::from_dynamic_image(&DynamicImage::ImageRgb8(image.clone())).unwrap();
        assert_eq!(*frame.format(), FrameFormat::RGB24);
        assert_eq!(frame.get(1, 2, 1), 20.0);
        assert_eq!(frame.get(2, 0, 0), 0.0);

        let back = frame.to_dynamic_image().unwrap();
        assert_eq!(back.to_rgb8(), image);
    }

    #[test]
    fn test_gray16_and_high_depth_export() {
        let frame = Frame::blank(FrameFormat::new(ColorFamily::Gray, SampleType::Integer, 10, 0, 0).unwrap(), 2, 2, &[512.0]).unwrap();
        let image = frame.to_dynamic_image().unwrap();
        assert_eq!(image.to_luma16().get_pixel(1, 1).0[0], 512 << 6);
    }

    #[test]
    fn test_yuv_is_rejected() {
        let frame = Frame::black(FrameFormat::YUV420P8, 4, 4).unwrap();
        assert!(frame.to_dynamic_image().is_err());
    }
}
