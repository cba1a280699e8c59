//! External collaborators.
//!
//! Pixel synthesis (border filling, outpainting), border colour detection and
//! perceptual frame difference are not implemented here. Operations that need
//! them reach them through these traits, bundled in [`Collaborators`].

use crate::core::error::{TileError, TileResult};
use crate::core::frame::Frame;
use crate::core::geometry::Margins;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Border fill strategies provided by a [`BorderFill`] collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Reflect the frame content at each edge
    Mirror,
    /// Replicate the outermost row or column
    Repeat,
    /// Fill from the neighbouring margin line
    FillMargins,
    /// Fill and correct the border
    FixBorders,
}

impl FillMode {
    /// Tag understood by fill implementations.
    pub fn tag(&self) -> &'static str {
        match self {
            FillMode::Mirror => "mirror",
            FillMode::Repeat => "repeat",
            FillMode::FillMargins => "fillmargins",
            FillMode::FixBorders => "fixborders",
        }
    }
}

/// Inpainting algorithms provided by an [`Outpaint`] collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutpaintAlgorithm {
    /// Fast marching method
    Telea,
    /// Navier-Stokes based
    #[serde(rename = "ns")]
    NavierStokes,
    /// Frequency selective reconstruction
    Fsr,
}

impl OutpaintAlgorithm {
    /// Tag understood by outpaint implementations.
    pub fn tag(&self) -> &'static str {
        match self {
            OutpaintAlgorithm::Telea => "telea",
            OutpaintAlgorithm::NavierStokes => "ns",
            OutpaintAlgorithm::Fsr => "fsr",
        }
    }
}

/// Fills borders around a frame.
pub trait BorderFill: Send + Sync {
    /// Return `frame` grown by `margins`, with the new border synthesized by
    /// `mode`. The interior must be left untouched.
    fn fill(&self, frame: &Frame, margins: Margins, mode: FillMode) -> TileResult<Frame>;
}

/// Synthesizes masked pixels.
pub trait Outpaint: Send + Sync {
    /// Return `frame` with every pixel where the Gray8 `mask` is 255 synthesized.
    fn outpaint(&self, frame: &Frame, mask: &Frame, algorithm: OutpaintAlgorithm) -> TileResult<Frame>;
}

/// Detects uniform borders such as letterboxes.
pub trait BorderDetect: Send + Sync {
    /// Measure the border of `frame` whose samples lie within `low..=high`
    /// (8-bit scale, per plane), at most `max` on each side.
    fn detect(&self, frame: &Frame, low: [u8; 3], high: [u8; 3], max: Margins) -> TileResult<Margins>;
}

/// Measures how different two consecutive frames look.
pub trait FrameDiff: Send + Sync {
    /// Non-negative difference score; 0 for identical frames.
    fn difference(&self, previous: &Frame, current: &Frame) -> TileResult<f64>;
}

/// Optional collaborator handles shared by all operations of a session.
#[derive(Clone, Default)]
pub struct Collaborators {
    border_fill: Option<Arc<dyn BorderFill>>,
    outpaint: Option<Arc<dyn Outpaint>>,
    border_detect: Option<Arc<dyn BorderDetect>>,
    frame_diff: Option<Arc<dyn FrameDiff>>,
}

impl Collaborators {
    /// No collaborators. Only self-contained modes work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the border fill collaborator.
    pub fn with_border_fill(mut self, fill: impl BorderFill + 'static) -> Self {
        self.border_fill = Some(Arc::new(fill));
        self
    }

    /// Set the outpaint collaborator.
    pub fn with_outpaint(mut self, outpaint: impl Outpaint + 'static) -> Self {
        self.outpaint = Some(Arc::new(outpaint));
        self
    }

    /// Set the border detection collaborator.
    pub fn with_border_detect(mut self, detect: impl BorderDetect + 'static) -> Self {
        self.border_detect = Some(Arc::new(detect));
        self
    }

    /// Set the frame difference collaborator.
    pub fn with_frame_diff(mut self, diff: impl FrameDiff + 'static) -> Self {
        self.frame_diff = Some(Arc::new(diff));
        self
    }

    pub(crate) fn border_fill(&self, mode: &str) -> TileResult<&dyn BorderFill> {
        self.border_fill.as_deref().ok_or_else(|| missing("border fill", mode))
    }

    pub(crate) fn outpaint(&self, mode: &str) -> TileResult<&dyn Outpaint> {
        self.outpaint.as_deref().ok_or_else(|| missing("outpaint", mode))
    }

    pub(crate) fn border_detect(&self) -> TileResult<&dyn BorderDetect> {
        self.border_detect
            .as_deref()
            .ok_or_else(|| missing("border detect", "autofill"))
    }

    pub(crate) fn frame_diff(&self) -> TileResult<&dyn FrameDiff> {
        self.frame_diff
            .as_deref()
            .ok_or_else(|| missing("frame difference", "mark_dups"))
    }
}

fn missing(collaborator: &'static str, mode: &str) -> TileError {
    TileError::MissingCollaborator {
        collaborator,
        mode: mode.to_string(),
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("border_fill", &self.border_fill.is_some())
            .field("outpaint", &self.outpaint.is_some())
            .field("border_detect", &self.border_detect.is_some())
            .field("frame_diff", &self.frame_diff.is_some())
            .finish()
    }
}
