//! Spatial padding and cropping.
//!
//! [`pad`] grows every frame of a clip by four margins and tags the clip with
//! a [`PadRecord`]; [`crop`] in auto mode reads that record back, rescaled to
//! the clip's current size, and removes exactly the padding again.

use crate::core::clip::Clip;
use crate::core::collab::{Collaborators, FillMode, OutpaintAlgorithm};
use crate::core::color::Color;
use crate::core::error::{TileError, TileResult};
use crate::core::format::FrameFormat;
use crate::core::frame::Frame;
use crate::core::geometry::{align_down, check_alignment, rescale, Margins, TileRegion};
use crate::core::metadata::{PadRecord, Tags};
use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How new border pixels are produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "ModeRepr")]
pub enum PadMode {
    /// Reflect the frame at each edge (border fill collaborator)
    #[default]
    Mirror,
    /// Replicate the outermost pixels (border fill collaborator)
    Repeat,
    /// Fill from the neighbouring margin (border fill collaborator)
    MarginFill,
    /// Fill and correct the border (border fill collaborator)
    FixBorders,
    /// Synthesize the border by inpainting (outpaint collaborator)
    Outpaint(OutpaintAlgorithm),
    /// Tile the frame periodically
    Wrap,
    /// The format's black
    Black,
    /// A solid colour on the 8-bit scale
    SolidColor(Color),
}

impl PadMode {
    /// Tag naming this mode in logs, errors and serialized configuration.
    pub fn tag(&self) -> &'static str {
        match self {
            PadMode::Mirror => "mirror",
            PadMode::Repeat => "repeat",
            PadMode::MarginFill => "fillmargins",
            PadMode::FixBorders => "fixborders",
            PadMode::Outpaint(algorithm) => algorithm.tag(),
            PadMode::Wrap => "wrap",
            PadMode::Black => "black",
            PadMode::SolidColor(_) => "color",
        }
    }

    /// Border fill strategy, if this mode delegates to a fill collaborator.
    pub fn fill_mode(&self) -> Option<FillMode> {
        match self {
            PadMode::Mirror => Some(FillMode::Mirror),
            PadMode::Repeat => Some(FillMode::Repeat),
            PadMode::MarginFill => Some(FillMode::FillMargins),
            PadMode::FixBorders => Some(FillMode::FixBorders),
            _ => None,
        }
    }
}

impl fmt::Display for PadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadMode::SolidColor(color) => write!(f, "color {:?}", color.values()),
            other => f.write_str(other.tag()),
        }
    }
}

impl FromStr for PadMode {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mirror" => Ok(PadMode::Mirror),
            "repeat" => Ok(PadMode::Repeat),
            "fillmargins" => Ok(PadMode::MarginFill),
            "fixborders" => Ok(PadMode::FixBorders),
            "telea" => Ok(PadMode::Outpaint(OutpaintAlgorithm::Telea)),
            "ns" => Ok(PadMode::Outpaint(OutpaintAlgorithm::NavierStokes)),
            "fsr" => Ok(PadMode::Outpaint(OutpaintAlgorithm::Fsr)),
            "wrap" => Ok(PadMode::Wrap),
            "black" => Ok(PadMode::Black),
            other => Err(TileError::invalid(
                "mode",
                format!(
                    "unknown mode '{}', expected mirror, wrap, repeat, fillmargins, fixborders, telea, ns, fsr, black or a color",
                    other
                ),
            )),
        }
    }
}

/// Serialized shape of pad modes: a tag, a gray level or a colour list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeRepr {
    /// A mode tag such as `"mirror"`
    Tag(String),
    /// One 8-bit value for all planes
    Gray(f64),
    /// Per-plane 8-bit values
    Color(Vec<f64>),
}

impl TryFrom<ModeRepr> for PadMode {
    type Error = TileError;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Tag(tag) => tag.parse(),
            ModeRepr::Gray(value) => Ok(PadMode::SolidColor(Color::gray(value))),
            ModeRepr::Color(values) => Ok(PadMode::SolidColor(Color::new(values))),
        }
    }
}

impl From<PadMode> for ModeRepr {
    fn from(mode: PadMode) -> Self {
        match mode {
            PadMode::SolidColor(color) => ModeRepr::Color(color.values().to_vec()),
            other => ModeRepr::Tag(other.tag().to_string()),
        }
    }
}

/// Edge policy for operations that may pad or discard: tiling and modulus alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "ModeRepr")]
pub enum TilePadding {
    /// Crop away whatever does not fit
    Discard,
    /// Pad up to the next full size
    Pad(PadMode),
}

/// Edge policy of [`align_to_modulus`].
pub type ModPadding = TilePadding;

impl Default for TilePadding {
    fn default() -> Self {
        TilePadding::Pad(PadMode::Mirror)
    }
}

impl FromStr for TilePadding {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("discard") {
            Ok(TilePadding::Discard)
        } else {
            s.parse().map(TilePadding::Pad)
        }
    }
}

impl TryFrom<ModeRepr> for TilePadding {
    type Error = TileError;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Tag(tag) => tag.parse(),
            other => PadMode::try_from(other).map(TilePadding::Pad),
        }
    }
}

impl From<TilePadding> for ModeRepr {
    fn from(padding: TilePadding) -> Self {
        match padding {
            TilePadding::Discard => ModeRepr::Tag("discard".to_string()),
            TilePadding::Pad(mode) => mode.into(),
        }
    }
}

/// Crop margins. `None` on every side selects auto mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropMargins {
    /// Pixels removed on the left
    pub left: Option<u32>,
    /// Pixels removed on the right
    pub right: Option<u32>,
    /// Pixels removed on the top
    pub top: Option<u32>,
    /// Pixels removed on the bottom
    pub bottom: Option<u32>,
}

impl CropMargins {
    /// Read the margins from the clip's pad record.
    pub fn auto() -> Self {
        Self::default()
    }

    /// Crop exactly these margins.
    pub fn manual(margins: Margins) -> Self {
        Self {
            left: Some(margins.left),
            right: Some(margins.right),
            top: Some(margins.top),
            bottom: Some(margins.bottom),
        }
    }

    /// Check if no side was given.
    pub fn is_auto(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

impl From<Margins> for CropMargins {
    fn from(margins: Margins) -> Self {
        Self::manual(margins)
    }
}

/// Pad every frame of `clip` by `margins` and attach a [`PadRecord`].
///
/// Zero margins leave the frames untouched but still attach an all-zero
/// record so that a later auto [`crop`] is a no-op.
pub fn pad(clip: &Clip, margins: Margins, mode: &PadMode, collaborators: &Collaborators) -> TileResult<Clip> {
    let record = PadRecord {
        orig_w: clip.width(),
        orig_h: clip.height(),
        pad_left: margins.left,
        pad_right: margins.right,
        pad_top: margins.top,
        pad_bottom: margins.bottom,
    };
    debug!(
        "Padding {} frames of {}x{} by {:?} with {}",
        clip.len(),
        clip.width(),
        clip.height(),
        margins,
        mode
    );

    let frames = pad_frames(clip, margins, mode, collaborators)?;
    let tags = Tags {
        pad: Some(record),
        ..clip.tags.clone()
    };
    Clip::with_tags(frames, tags)
}

/// Pad the frames of `clip` without touching its tags.
pub(crate) fn pad_frames(
    clip: &Clip,
    margins: Margins,
    mode: &PadMode,
    collaborators: &Collaborators,
) -> TileResult<Vec<Frame>> {
    margins.check_alignment(clip.format(), "pad")?;
    margins.padded_size(clip.width(), clip.height())?;
    if margins.is_zero() {
        return Ok(clip.frames().to_vec());
    }
    clip.frames()
        .par_iter()
        .map(|frame| pad_frame(frame, margins, mode, collaborators))
        .collect()
}

pub(crate) fn pad_frame(frame: &Frame, margins: Margins, mode: &PadMode, collaborators: &Collaborators) -> TileResult<Frame> {
    match mode {
        PadMode::Mirror => mirror_steps(frame, margins, collaborators),
        PadMode::Repeat | PadMode::MarginFill | PadMode::FixBorders => {
            let fill_mode = mode.fill_mode().unwrap_or(FillMode::Repeat);
            let filled = collaborators.border_fill(mode.tag())?.fill(frame, margins, fill_mode)?;
            keep_interior(filled, frame, margins, "border fill")
        }
        PadMode::Outpaint(algorithm) => outpaint_borders(frame, margins, *algorithm, collaborators),
        PadMode::Wrap => wrap(frame, margins),
        PadMode::Black => frame.add_borders(margins, &frame.format().black()),
        PadMode::SolidColor(color) => frame.add_borders(margins, &color.normalize(frame.format())?),
    }
}

/// Mirror in steps no larger than the current extent, so a reflection never
/// has to reach past the far edge.
fn mirror_steps(frame: &Frame, mut margins: Margins, collaborators: &Collaborators) -> TileResult<Frame> {
    let fill = collaborators.border_fill(PadMode::Mirror.tag())?;
    let mut current = frame.clone();
    while !margins.is_zero() {
        let step = Margins::new(
            margins.left.min(current.width()),
            margins.right.min(current.width()),
            margins.top.min(current.height()),
            margins.bottom.min(current.height()),
        );
        trace!("Mirror step {:?} on {}x{}", step, current.width(), current.height());
        let filled = fill.fill(&current, step, FillMode::Mirror)?;
        current = keep_interior(filled, &current, step, "border fill")?;
        margins = Margins::new(
            margins.left - step.left,
            margins.right - step.right,
            margins.top - step.top,
            margins.bottom - step.bottom,
        );
    }
    Ok(current)
}

/// Check a collaborator result and restore the original pixels inside it.
pub(crate) fn keep_interior(filled: Frame, original: &Frame, margins: Margins, collaborator: &'static str) -> TileResult<Frame> {
    let (width, height) = margins.padded_size(original.width(), original.height())?;
    if filled.format() != original.format() || filled.width() != width || filled.height() != height {
        return Err(TileError::Collaborator {
            collaborator,
            reason: format!(
                "returned {}x{} {}, expected {}x{} {}",
                filled.width(),
                filled.height(),
                filled.format(),
                width,
                height,
                original.format()
            ),
        });
    }
    filled.paste(original, margins.left, margins.top)
}

/// Gray8 coverage mask: 255 on the margins, 0 inside.
pub(crate) fn coverage_mask(width: u32, height: u32, margins: Margins) -> TileResult<Frame> {
    Frame::blank(
        FrameFormat::GRAY8,
        width - margins.horizontal(),
        height - margins.vertical(),
        &[0.0],
    )?
    .add_borders(margins, &[255.0])
}

fn outpaint_borders(
    frame: &Frame,
    margins: Margins,
    algorithm: OutpaintAlgorithm,
    collaborators: &Collaborators,
) -> TileResult<Frame> {
    let outpaint = collaborators.outpaint(algorithm.tag())?;
    let canvas = frame.add_borders(margins, &frame.format().black())?;
    let mask = coverage_mask(canvas.width(), canvas.height(), margins)?;
    let painted = outpaint.outpaint(&canvas, &mask, algorithm)?;
    keep_interior(painted, frame, margins, "outpaint")
}

/// Periodic padding: repeat the frame `ceil(margin / extent)` times per side,
/// then cut out the padded window.
fn wrap(frame: &Frame, margins: Margins) -> TileResult<Frame> {
    let (width, height) = (frame.width(), frame.height());
    let (padded_w, padded_h) = margins.padded_size(width, height)?;
    let tiles_l = margins.left.div_ceil(width);
    let tiles_r = margins.right.div_ceil(width);
    let tiles_t = margins.top.div_ceil(height);
    let tiles_b = margins.bottom.div_ceil(height);

    let mut out = frame.clone();
    if tiles_l + tiles_r > 0 {
        out = Frame::stack_horizontal(&vec![out; (tiles_l + 1 + tiles_r) as usize])?;
    }
    if tiles_t + tiles_b > 0 {
        out = Frame::stack_vertical(&vec![out; (tiles_t + 1 + tiles_b) as usize])?;
    }
    out.crop_region(TileRegion::new(
        tiles_l * width - margins.left,
        tiles_t * height - margins.top,
        padded_w,
        padded_h,
    ))
}

/// Remove padding, either given manually or recovered from the pad record.
///
/// Auto mode rescales the recorded margins by the ratio of the current size
/// to the padded size at the time of padding. The pad record is removed in
/// both modes.
pub fn crop(clip: &Clip, margins: CropMargins) -> TileResult<Clip> {
    let (width, height) = (clip.width(), clip.height());
    let resolved = if margins.is_auto() {
        let record = Tags::require(&clip.tags.pad)?;
        let (padded_w, padded_h) = (record.padded_width(), record.padded_height());
        let scaled = Margins::new(
            rescale(record.pad_left, padded_w, width),
            rescale(record.pad_right, padded_w, width),
            rescale(record.pad_top, padded_h, height),
            rescale(record.pad_bottom, padded_h, height),
        );
        let (sub_w, sub_h) = (clip.format().sub_w(), clip.format().sub_h());
        let resolved = Margins::new(
            align_down(scaled.left, sub_w),
            align_down(scaled.right, sub_w),
            align_down(scaled.top, sub_h),
            align_down(scaled.bottom, sub_h),
        );
        if resolved != scaled {
            warn!(
                "Auto crop margins {:?} are not aligned to {}, using {:?}",
                scaled,
                clip.format(),
                resolved
            );
        }
        debug!(
            "Auto crop: padded {}x{} now {}x{}, cropping {:?}",
            padded_w, padded_h, width, height, resolved
        );
        resolved
    } else {
        Margins::new(
            margins.left.unwrap_or(0),
            margins.right.unwrap_or(0),
            margins.top.unwrap_or(0),
            margins.bottom.unwrap_or(0),
        )
    };

    let tags = Tags {
        pad: None,
        ..clip.tags.clone()
    };
    if resolved.is_zero() {
        return Ok(clip.clone().retag(tags));
    }
    resolved.check_alignment(clip.format(), "crop")?;
    let frames = clip
        .frames()
        .par_iter()
        .map(|frame| frame.crop_margins(resolved))
        .collect::<TileResult<Vec<_>>>()?;
    Clip::with_tags(frames, tags)
}

/// Make both dimensions multiples of `modulus` (width, height).
///
/// With [`TilePadding::Pad`] the right and bottom edges are padded up to the
/// next multiple and a pad record is always attached, so auto [`crop`]
/// restores the input. With [`TilePadding::Discard`] the frames are cropped
/// down to the previous multiple.
pub fn align_to_modulus(
    clip: &Clip,
    modulus: (u32, u32),
    padding: &ModPadding,
    collaborators: &Collaborators,
) -> TileResult<Clip> {
    let (mod_w, mod_h) = modulus;
    if mod_w < 1 || mod_h < 1 {
        return Err(TileError::invalid("modulus", "modulus needs to be at least 1"));
    }
    let format = clip.format();
    check_alignment(mod_w as u64, format.sub_w(), "Modulus", format)?;
    check_alignment(mod_h as u64, format.sub_h(), "Modulus", format)?;
    let (width, height) = (clip.width(), clip.height());

    match padding {
        TilePadding::Discard => {
            let (crop_r, crop_b) = (width % mod_w, height % mod_h);
            if crop_r == 0 && crop_b == 0 {
                return Ok(clip.clone());
            }
            debug!("Cropping {}x{} down to mod {}x{}", width, height, mod_w, mod_h);
            crop(clip, Margins::new(0, crop_r, 0, crop_b).into()).map(|cropped| cropped.retag(clip.tags.clone()))
        }
        TilePadding::Pad(mode) => {
            let pad_w = (mod_w - width % mod_w) % mod_w;
            let pad_h = (mod_h - height % mod_h) % mod_h;
            pad(clip, Margins::new(0, pad_w, 0, pad_h), mode, collaborators)
        }
    }
}
