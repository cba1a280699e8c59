//! Temporal windowing and reassembly.
//!
//! [`window`] cuts a clip into overlapping windows of a fixed length and
//! splices them back to back: with length 20 and overlap 5 the output holds
//! frames 0-19, 15-34, 30-49 and so on. [`unwindow`] splits the spliced clip
//! at every `window_length` frames and removes the overlaps again, either by
//! dropping them or by crossfading across them.

use crate::core::clip::Clip;
use crate::core::error::{TileError, TileResult};
use crate::core::frame::Frame;
use crate::core::geometry::check_chunk_limit;
use crate::core::metadata::{Tags, WindowRecord};
use crate::spatial::pad::ModeRepr;
use crate::temporal::crossfade::crossfade_frames;
use crate::temporal::tpad::{tpad, TemporalExtent, TemporalPadMode};
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What happens to a final window shorter than the window length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "ModeRepr")]
pub enum WindowPadding {
    /// Drop it
    Discard,
    /// Keep it short
    None,
    /// Extend it with temporal padding
    Pad(TemporalPadMode),
}

impl Default for WindowPadding {
    fn default() -> Self {
        WindowPadding::Pad(TemporalPadMode::Mirror)
    }
}

impl WindowPadding {
    /// Tag stored in the window record.
    pub fn tag(&self) -> &'static str {
        match self {
            WindowPadding::Discard => "discard",
            WindowPadding::None => "none",
            WindowPadding::Pad(mode) => mode.tag(),
        }
    }
}

impl FromStr for WindowPadding {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discard" => Ok(WindowPadding::Discard),
            "none" => Ok(WindowPadding::None),
            other => other.parse().map(WindowPadding::Pad),
        }
    }
}

impl TryFrom<ModeRepr> for WindowPadding {
    type Error = TileError;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Tag(tag) => tag.parse(),
            other => TemporalPadMode::try_from(other).map(WindowPadding::Pad),
        }
    }
}

impl From<WindowPadding> for ModeRepr {
    fn from(padding: WindowPadding) -> Self {
        match padding {
            WindowPadding::Pad(mode) => mode.into(),
            other => ModeRepr::Tag(other.tag().to_string()),
        }
    }
}

/// Window geometry and the policy for a short final window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    /// Frames per window
    pub length: usize,
    /// Frames shared by consecutive windows
    pub overlap: usize,
    /// Short final window policy
    pub padding: WindowPadding,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            length: 20,
            overlap: 5,
            padding: WindowPadding::default(),
        }
    }
}

impl WindowSpec {
    /// Windows of `length` frames sharing `overlap` frames.
    pub fn new(length: usize, overlap: usize) -> Self {
        Self {
            length,
            overlap,
            ..Self::default()
        }
    }

    /// Set the short final window policy.
    pub fn padding(mut self, padding: WindowPadding) -> Self {
        self.padding = padding;
        self
    }
}

fn check_window(length: usize, overlap: usize) -> TileResult<()> {
    if length < 1 {
        return Err(TileError::invalid("length", "window length must be at least 1"));
    }
    if overlap >= length {
        return Err(TileError::InvalidOverlap {
            parameter: "overlap",
            overlap: overlap as u64,
            size: length as u64,
        });
    }
    Ok(())
}

/// Cut `clip` into overlapping windows and splice them.
///
/// Attaches a [`WindowRecord`]; other tags are kept.
pub fn window(clip: &Clip, spec: &WindowSpec) -> TileResult<Clip> {
    let (length, overlap) = (spec.length, spec.overlap);
    check_window(length, overlap)?;
    let total = clip.len();
    let stride = length - overlap;
    let count = total.div_ceil(stride);
    check_chunk_limit(count)?;
    debug!(
        "Windowing {} frames into {} windows of {} (overlap {}, padding {})",
        total,
        count,
        length,
        overlap,
        spec.padding.tag()
    );

    let mut frames: Vec<Frame> = Vec::with_capacity(count * length);
    for start in (0..total).step_by(stride) {
        let end = total.min(start + length);
        let chunk = &clip.frames()[start..end];
        if chunk.len() == length {
            frames.extend_from_slice(chunk);
            continue;
        }
        match &spec.padding {
            WindowPadding::Discard => break,
            WindowPadding::None => frames.extend_from_slice(chunk),
            WindowPadding::Pad(mode) => {
                let short = Clip::new(chunk.to_vec())?;
                let padded = tpad(&short, TemporalExtent::Length(length), mode)?;
                frames.extend(padded.into_frames());
            }
        }
    }
    if frames.is_empty() {
        return Err(TileError::invalid(
            "length",
            format!(
                "no full window of {} frames fits into {} frames and the short window was discarded",
                length, total
            ),
        ));
    }

    let tags = Tags {
        window: Some(WindowRecord {
            orig_length: total,
            window_length: length,
            overlap,
            padding_tag: spec.padding.tag().to_string(),
        }),
        ..clip.tags.clone()
    };
    Clip::with_tags(frames, tags)
}

/// Reassembly options.
///
/// Leave all of `full_length`, `window_length` and `overlap` unset to read
/// them from the clip's window record, or set all three. A discarded final
/// window has to be accounted for in `full_length` in manual mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnwindowOptions {
    /// Crossfade across overlaps instead of dropping them
    pub fade: bool,
    /// Length of the reassembled clip
    pub full_length: Option<usize>,
    /// Frames per window
    pub window_length: Option<usize>,
    /// Frames shared by consecutive windows
    pub overlap: Option<usize>,
}

impl UnwindowOptions {
    /// Auto mode with dropped overlaps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Crossfade or drop the overlaps.
    pub fn fade(mut self, fade: bool) -> Self {
        self.fade = fade;
        self
    }

    /// Manual geometry.
    pub fn manual(mut self, full_length: usize, window_length: usize, overlap: usize) -> Self {
        self.full_length = Some(full_length);
        self.window_length = Some(window_length);
        self.overlap = Some(overlap);
        self
    }
}

/// Undo [`window`].
pub fn unwindow(clip: &Clip, options: &UnwindowOptions) -> TileResult<Clip> {
    let (full_length, length, overlap) = match (options.full_length, options.window_length, options.overlap) {
        (None, None, None) => {
            let record = Tags::require(&clip.tags.window)?;
            if record.window_length < 1 || record.overlap >= record.window_length {
                return Err(TileError::CorruptMetadata {
                    record: "window",
                    reason: format!(
                        "window length {} with overlap {}",
                        record.window_length, record.overlap
                    ),
                });
            }
            (record.orig_length, record.window_length, record.overlap)
        }
        (Some(full_length), Some(length), Some(overlap)) => {
            check_window(length, overlap)?;
            (full_length, length, overlap)
        }
        _ => {
            return Err(TileError::IncompleteParameters {
                operation: "unwindow",
                expected: "'full_length', 'window_length' and 'overlap'",
            })
        }
    };
    if full_length < 1 {
        return Err(TileError::invalid("full_length", "full length must be at least 1"));
    }
    debug!(
        "Unwindowing {} frames: windows of {} (overlap {}) into {} frames, fade {}",
        clip.len(),
        length,
        overlap,
        full_length,
        options.fade
    );

    let mut windows = clip.frames().chunks(length);
    let mut frames = windows.next().map(<[Frame]>::to_vec).unwrap_or_default();
    for next in windows {
        if options.fade && overlap > 0 {
            let blend = overlap.min(frames.len()).min(next.len());
            frames = crossfade_frames(&frames, next, blend)?;
        } else {
            let drop = overlap.min(next.len());
            frames.extend_from_slice(&next[drop..]);
        }
    }
    frames.truncate(full_length);

    let tags = Tags {
        window: None,
        ..clip.tags.clone()
    };
    Clip::with_tags(frames, tags)
}
