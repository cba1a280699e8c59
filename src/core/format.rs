//! Frame format descriptors.
//!
//! A format fixes the plane layout, sample representation and chroma
//! subsampling of a frame. Subsampling drives the alignment that every
//! spatial offset and extent must respect.

use crate::core::error::{TileError, TileResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How samples are represented.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// Unsigned integers of 8 to 16 bits
    Integer,
    /// Floating point (half floats are widened)
    Float,
}

/// Color family of a format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColorFamily {
    /// One plane
    Gray,
    /// Red, green and blue planes
    Rgb,
    /// Luma and two chroma planes, possibly subsampled
    Yuv,
}

/// Plane layout, sample representation and chroma subsampling of a frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FrameFormat {
    /// Color family (decides the plane count)
    pub color_family: ColorFamily,
    /// Integer or floating samples
    pub sample_type: SampleType,
    /// Bits per sample (8..=16 for integer, 16 or 32 for float)
    pub bits_per_sample: u8,
    /// Horizontal chroma subsampling shift
    pub subsampling_w: u8,
    /// Vertical chroma subsampling shift
    pub subsampling_h: u8,
}

macro_rules! preset {
    ($name:ident, $family:ident, $sample:ident, $bits:expr, $sw:expr, $sh:expr, $doc:literal) => {
        #[doc = $doc]
        pub const $name: FrameFormat = FrameFormat {
            color_family: ColorFamily::$family,
            sample_type: SampleType::$sample,
            bits_per_sample: $bits,
            subsampling_w: $sw,
            subsampling_h: $sh,
        };
    };
}

impl FrameFormat {
    preset!(GRAY8, Gray, Integer, 8, 0, 0, "8-bit single plane.");
    preset!(GRAY16, Gray, Integer, 16, 0, 0, "16-bit single plane.");
    preset!(GRAYS, Gray, Float, 32, 0, 0, "32-bit float single plane.");
    preset!(RGB24, Rgb, Integer, 8, 0, 0, "8-bit planar RGB.");
    preset!(RGB48, Rgb, Integer, 16, 0, 0, "16-bit planar RGB.");
    preset!(RGBS, Rgb, Float, 32, 0, 0, "32-bit float planar RGB.");
    preset!(YUV420P8, Yuv, Integer, 8, 1, 1, "8-bit YUV with 4:2:0 chroma.");
    preset!(YUV420P10, Yuv, Integer, 10, 1, 1, "10-bit YUV with 4:2:0 chroma.");
    preset!(YUV420P16, Yuv, Integer, 16, 1, 1, "16-bit YUV with 4:2:0 chroma.");
    preset!(YUV422P8, Yuv, Integer, 8, 1, 0, "8-bit YUV with 4:2:2 chroma.");
    preset!(YUV444P8, Yuv, Integer, 8, 0, 0, "8-bit YUV without subsampling.");
    preset!(YUV444P16, Yuv, Integer, 16, 0, 0, "16-bit YUV without subsampling.");
    preset!(YUV420PS, Yuv, Float, 32, 1, 1, "32-bit float YUV with 4:2:0 chroma.");
    preset!(YUV444PS, Yuv, Float, 32, 0, 0, "32-bit float YUV without subsampling.");

    /// Create and validate a format.
    pub fn new(
        color_family: ColorFamily,
        sample_type: SampleType,
        bits_per_sample: u8,
        subsampling_w: u8,
        subsampling_h: u8,
    ) -> TileResult<Self> {
        let valid_bits = match sample_type {
            SampleType::Integer => (8..=16).contains(&bits_per_sample),
            SampleType::Float => bits_per_sample == 16 || bits_per_sample == 32,
        };
        if !valid_bits {
            return Err(TileError::invalid(
                "bits_per_sample",
                format!("{} bits are not supported for {:?} samples", bits_per_sample, sample_type),
            ));
        }
        if subsampling_w > 2 || subsampling_h > 2 {
            return Err(TileError::invalid(
                "subsampling",
                "subsampling shifts must be at most 2",
            ));
        }
        if color_family != ColorFamily::Yuv && (subsampling_w != 0 || subsampling_h != 0) {
            return Err(TileError::invalid(
                "subsampling",
                "only YUV formats can be subsampled",
            ));
        }
        Ok(Self {
            color_family,
            sample_type,
            bits_per_sample,
            subsampling_w,
            subsampling_h,
        })
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        match self.color_family {
            ColorFamily::Gray => 1,
            ColorFamily::Rgb | ColorFamily::Yuv => 3,
        }
    }

    /// Horizontal alignment unit in luma pixels.
    pub fn sub_w(&self) -> u32 {
        1 << self.subsampling_w
    }

    /// Vertical alignment unit in luma pixels.
    pub fn sub_h(&self) -> u32 {
        1 << self.subsampling_h
    }

    /// Largest sample value (1.0 for float).
    pub fn peak(&self) -> f64 {
        match self.sample_type {
            SampleType::Integer => ((1u32 << self.bits_per_sample) - 1) as f64,
            SampleType::Float => 1.0,
        }
    }

    /// Check whether samples are stored as integers.
    pub fn is_integer(&self) -> bool {
        self.sample_type == SampleType::Integer
    }

    /// Dimensions of plane `index` for a frame of the given luma size.
    pub fn plane_dimensions(&self, index: usize, width: u32, height: u32) -> (u32, u32) {
        if index == 0 || self.color_family != ColorFamily::Yuv {
            (width, height)
        } else {
            (width >> self.subsampling_w, height >> self.subsampling_h)
        }
    }

    /// Single-plane format with the same sample representation, used for masks.
    pub fn mask_format(&self) -> FrameFormat {
        FrameFormat {
            color_family: ColorFamily::Gray,
            sample_type: self.sample_type,
            bits_per_sample: self.bits_per_sample,
            subsampling_w: 0,
            subsampling_h: 0,
        }
    }

    /// Per-plane values of this format's black.
    pub fn black(&self) -> Vec<f64> {
        match (self.color_family, self.sample_type) {
            (ColorFamily::Yuv, SampleType::Integer) => {
                let bits = self.bits_per_sample as u32;
                vec![
                    (16u32 << (bits - 8)) as f64,
                    (1u32 << (bits - 1)) as f64,
                    (1u32 << (bits - 1)) as f64,
                ]
            }
            _ => vec![0.0; self.num_planes()],
        }
    }

    /// Human readable name such as `YUV420P8` or `RGBS`.
    pub fn name(&self) -> String {
        let family = match self.color_family {
            ColorFamily::Gray => "GRAY",
            ColorFamily::Rgb => "RGB",
            ColorFamily::Yuv => "YUV",
        };
        let layout = match self.color_family {
            ColorFamily::Yuv => match (self.subsampling_w, self.subsampling_h) {
                (1, 1) => "420P",
                (1, 0) => "422P",
                (0, 0) => "444P",
                (2, 0) => "411P",
                (2, 2) => "410P",
                _ => "P",
            },
            _ => "",
        };
        let depth = match (self.sample_type, self.bits_per_sample) {
            (SampleType::Float, 32) => "S".to_string(),
            (SampleType::Float, _) => "H".to_string(),
            (SampleType::Integer, bits) if self.color_family == ColorFamily::Rgb => {
                (bits as u32 * 3).to_string()
            }
            (SampleType::Integer, bits) => bits.to_string(),
        };
        format!("{}{}{}", family, layout, depth)
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
