//! Colors on the 8-bit scale used throughout the public API.

use crate::core::error::{TileError, TileResult};
use crate::core::format::{FrameFormat, SampleType};
use serde::{Deserialize, Serialize};

/// Per-plane color values on an 8-bit (0 to 255) scale.
///
/// The values are independent of the frame's real bit depth and are
/// normalized with [`Color::normalize`] right before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(Vec<f64>);

impl Color {
    /// Create a color from per-plane values.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self(values.into())
    }

    /// One value for every plane.
    pub fn gray(value: f64) -> Self {
        Self(vec![value])
    }

    /// Raw 8-bit scale values.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Check that the values fit the 8-bit scale without scaling them.
    pub fn check_range(&self, parameter: &'static str) -> TileResult<()> {
        if self.0.is_empty() {
            return Err(TileError::invalid(parameter, "color needs at least one value"));
        }
        if !self.0.iter().all(|v| (0.0..=255.0).contains(v)) {
            return Err(TileError::invalid(parameter, "color values must be in range 0-255"));
        }
        Ok(())
    }

    /// Convert to native sample values of `format`.
    ///
    /// Missing planes repeat the last value. Integer formats scale to the
    /// format's peak and round; float formats divide by 255.
    pub fn normalize(&self, format: &FrameFormat) -> TileResult<Vec<f64>> {
        self.check_range("color")?;
        let num_planes = format.num_planes();
        if self.0.len() > num_planes {
            return Err(TileError::invalid(
                "color",
                format!(
                    "{} color values given for format {} with {} planes",
                    self.0.len(),
                    format,
                    num_planes
                ),
            ));
        }
        let last = self.0[self.0.len() - 1];
        let values = self
            .0
            .iter()
            .copied()
            .chain(std::iter::repeat(last))
            .take(num_planes);
        Ok(match format.sample_type {
            SampleType::Integer => {
                let peak = format.peak();
                values.map(|v| (v * peak / 255.0).round()).collect()
            }
            SampleType::Float => values.map(|v| v / 255.0).collect(),
        })
    }
}

impl From<[f64; 3]> for Color {
    fn from(values: [f64; 3]) -> Self {
        Self(values.to_vec())
    }
}

impl From<f64> for Color {
    fn from(value: f64) -> Self {
        Self::gray(value)
    }
}
