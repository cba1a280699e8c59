//! Detection and refilling of uniform borders such as letterboxes.

use crate::core::clip::Clip;
use crate::core::collab::Collaborators;
use crate::core::color::Color;
use crate::core::error::{TileError, TileResult};
use crate::core::format::{ColorFamily, FrameFormat};
use crate::core::frame::Frame;
use crate::core::geometry::{align_down, check_alignment, Margins};
use crate::spatial::pad::{coverage_mask, keep_interior, pad_frame, PadMode};
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Border detection and fill settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofillOptions {
    /// Largest border searched on each side
    pub max: Margins,
    /// Extra pixels added to every side where a border was found
    pub offset: i32,
    /// Border colour on the 8-bit scale
    pub color: Color,
    /// Per-plane tolerance around `color`; the last value repeats
    pub tolerance: Vec<f64>,
    /// How the detected border is refilled
    pub fill: PadMode,
}

impl Default for AutofillOptions {
    fn default() -> Self {
        Self {
            max: Margins::default(),
            offset: 0,
            color: Color::from([16.0, 128.0, 128.0]),
            tolerance: vec![16.0],
            fill: PadMode::Mirror,
        }
    }
}

impl AutofillOptions {
    /// Search up to `max` on each side with the default colour and fill.
    pub fn new(max: Margins) -> Self {
        Self {
            max,
            ..Self::default()
        }
    }

    /// Set the offset.
    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the fill mode.
    pub fn fill(mut self, fill: PadMode) -> Self {
        self.fill = fill;
        self
    }

    /// Set the tolerance.
    pub fn tolerance(mut self, tolerance: impl Into<Vec<f64>>) -> Self {
        self.tolerance = tolerance.into();
        self
    }

    /// Detection range `(low, high)` per plane on the 8-bit scale.
    fn color_range(&self) -> TileResult<([u8; 3], [u8; 3])> {
        self.color.check_range("color")?;
        if self.tolerance.is_empty() {
            return Err(TileError::invalid("tolerance", "tolerance needs at least one value"));
        }
        if self.tolerance.len() > 3 {
            return Err(TileError::invalid(
                "tolerance",
                format!("{} tolerance values given for 3 planes", self.tolerance.len()),
            ));
        }
        if let Some(&value) = self.tolerance.iter().find(|t| !(**t >= 0.0)) {
            return Err(TileError::NegativeValue {
                parameter: "Tolerance",
                value,
            });
        }

        let broadcast = |values: &[f64], index: usize| values.get(index).or(values.last()).copied().unwrap_or(0.0);
        let mut low = [0u8; 3];
        let mut high = [0u8; 3];
        for plane in 0..3 {
            let color = broadcast(self.color.values(), plane);
            let tolerance = broadcast(self.tolerance.as_slice(), plane);
            low[plane] = clamp8(color - tolerance);
            high[plane] = clamp8(color + tolerance);
        }
        Ok((low, high))
    }
}

fn clamp8(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Shift a detected side by `offset`, leaving empty sides alone.
fn shift_side(side: u32, offset: i32) -> u32 {
    if side == 0 {
        0
    } else {
        (side as i64 + offset as i64).max(0) as u32
    }
}

/// Find uniform borders on every frame and fill them again.
///
/// Only YUV clips are accepted. Each frame is measured separately, so
/// borders that change over time are followed. Tags are kept.
pub fn autofill(clip: &Clip, options: &AutofillOptions, collaborators: &Collaborators) -> TileResult<Clip> {
    let format = *clip.format();
    if format.color_family != ColorFamily::Yuv {
        return Err(TileError::invalid(
            "clip",
            format!("autofill needs a YUV clip, got {}", format),
        ));
    }
    let (low, high) = options.color_range()?;
    if options.fill == PadMode::Wrap {
        return Err(TileError::invalid("fill", "wrap can not fill a border inwards"));
    }
    if options.max.is_zero() {
        return Ok(clip.clone());
    }
    options.max.check_alignment(&format, "fill")?;
    let offset = options.offset.unsigned_abs() as u64;
    check_alignment(offset, format.sub_w(), "Offset", &format)?;
    check_alignment(offset, format.sub_h(), "Offset", &format)?;

    let detect = collaborators.border_detect()?;
    debug!(
        "Autofill on {} frames: max {:?}, offset {}, range {:?}..={:?}, fill {}",
        clip.len(),
        options.max,
        options.offset,
        low,
        high,
        options.fill
    );

    let frames = clip
        .frames()
        .par_iter()
        .enumerate()
        .map(|(n, frame)| {
            let found = detect.detect(frame, low, high, options.max)?;
            let margins = resolve_margins(found, options.offset, &format);
            trace!("Frame {}: border {:?}, filling {:?}", n, found, margins);
            if margins.is_zero() {
                Ok(frame.clone())
            } else {
                refill(frame, margins, &options.fill, collaborators)
            }
        })
        .collect::<TileResult<Vec<_>>>()?;
    Clip::with_tags(frames, clip.tags.clone())
}

fn resolve_margins(found: Margins, offset: i32, format: &FrameFormat) -> Margins {
    let (sub_w, sub_h) = (format.sub_w(), format.sub_h());
    Margins::new(
        shift_side(align_down(found.left, sub_w), offset),
        shift_side(align_down(found.right, sub_w), offset),
        shift_side(align_down(found.top, sub_h), offset),
        shift_side(align_down(found.bottom, sub_h), offset),
    )
}

/// Replace the outer `margins` of `frame` with content produced by `mode`.
fn refill(frame: &Frame, margins: Margins, mode: &PadMode, collaborators: &Collaborators) -> TileResult<Frame> {
    let interior = frame.crop_margins(margins)?;
    match mode {
        PadMode::Outpaint(algorithm) => {
            let outpaint = collaborators.outpaint(algorithm.tag())?;
            let mask = coverage_mask(frame.width(), frame.height(), margins)?;
            let painted = outpaint.outpaint(frame, &mask, *algorithm)?;
            keep_interior(painted, &interior, margins, "outpaint")
        }
        other => {
            let filled = pad_frame(&interior, margins, other, collaborators)?;
            if !filled.same_geometry(frame) {
                return Err(TileError::Collaborator {
                    collaborator: "border fill",
                    reason: format!(
                        "refilled frame is {}x{}, expected {}x{}",
                        filled.width(),
                        filled.height(),
                        frame.width(),
                        frame.height()
                    ),
                });
            }
            Ok(filled)
        }
    }
}
