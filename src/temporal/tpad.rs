//! Temporal padding and trimming.
//!
//! [`tpad`] is the frame-count analogue of spatial padding: it extends a
//! clip at its start and end and records how many frames were added, so
//! that [`trim`] can remove exactly those frames again.

use crate::core::clip::Clip;
use crate::core::color::Color;
use crate::core::error::{TileError, TileResult};
use crate::core::frame::Frame;
use crate::core::metadata::{Tags, TemporalPadRecord};
use crate::spatial::pad::ModeRepr;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How new frames are produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "ModeRepr")]
pub enum TemporalPadMode {
    /// Ping-pong through the clip without repeating the boundary frame
    #[default]
    Mirror,
    /// Play the whole clip again
    Loop,
    /// Hold the boundary frame
    Repeat,
    /// Frames of the format's black
    Black,
    /// Frames of a solid colour on the 8-bit scale
    Color(Color),
}

impl TemporalPadMode {
    /// Tag naming this mode in logs and window records.
    pub fn tag(&self) -> &'static str {
        match self {
            TemporalPadMode::Mirror => "mirror",
            TemporalPadMode::Loop => "loop",
            TemporalPadMode::Repeat => "repeat",
            TemporalPadMode::Black => "black",
            TemporalPadMode::Color(_) => "color",
        }
    }
}

impl fmt::Display for TemporalPadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalPadMode::Color(color) => write!(f, "color {:?}", color.values()),
            other => f.write_str(other.tag()),
        }
    }
}

impl FromStr for TemporalPadMode {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mirror" => Ok(TemporalPadMode::Mirror),
            "loop" => Ok(TemporalPadMode::Loop),
            "repeat" => Ok(TemporalPadMode::Repeat),
            "black" => Ok(TemporalPadMode::Black),
            other => Err(TileError::invalid(
                "mode",
                format!(
                    "unknown mode '{}', expected mirror, loop, repeat, black or a color",
                    other
                ),
            )),
        }
    }
}

impl TryFrom<ModeRepr> for TemporalPadMode {
    type Error = TileError;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Tag(tag) => tag.parse(),
            ModeRepr::Gray(value) => Ok(TemporalPadMode::Color(Color::gray(value))),
            ModeRepr::Color(values) => Ok(TemporalPadMode::Color(Color::new(values))),
        }
    }
}

impl From<TemporalPadMode> for ModeRepr {
    fn from(mode: TemporalPadMode) -> Self {
        match mode {
            TemporalPadMode::Color(color) => ModeRepr::Color(color.values().to_vec()),
            other => ModeRepr::Tag(other.tag().to_string()),
        }
    }
}

/// How many frames [`tpad`] adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalExtent {
    /// Add `start` frames before and `end` frames after the clip
    Frames {
        /// Frames added before the first frame
        start: usize,
        /// Frames added after the last frame
        end: usize,
    },
    /// Pad at the end up to an absolute length; longer clips are kept as is
    Length(usize),
}

/// Extend a clip in time and attach a [`TemporalPadRecord`].
pub fn tpad(clip: &Clip, extent: TemporalExtent, mode: &TemporalPadMode) -> TileResult<Clip> {
    let (add_start, add_end) = match extent {
        TemporalExtent::Frames { start, end } => (start, end),
        TemporalExtent::Length(length) => {
            if length < 1 {
                return Err(TileError::invalid("length", "length must be at least 1"));
            }
            (0, length.saturating_sub(clip.len()))
        }
    };
    debug!(
        "Temporal pad of {} frames: {} before, {} after, mode {}",
        clip.len(),
        add_start,
        add_end,
        mode
    );

    let mut frames = Vec::with_capacity(add_start + clip.len() + add_end);
    if add_start > 0 {
        frames.extend(start_frames(clip.frames(), add_start, mode)?);
    }
    frames.extend_from_slice(clip.frames());
    if add_end > 0 {
        frames.extend(end_frames(clip.frames(), add_end, mode)?);
    }

    let tags = Tags {
        temporal_pad: Some(TemporalPadRecord {
            start_pad: add_start,
            end_pad: add_end,
        }),
        ..clip.tags.clone()
    };
    Clip::with_tags(frames, tags)
}

fn blank_frame(template: &Frame, mode: &TemporalPadMode) -> TileResult<Frame> {
    let format = *template.format();
    let values = match mode {
        TemporalPadMode::Color(color) => color.normalize(&format)?,
        _ => format.black(),
    };
    Frame::blank(format, template.width(), template.height(), &values)
}

/// `n` frames to place after `frames`.
fn end_frames(frames: &[Frame], n: usize, mode: &TemporalPadMode) -> TileResult<Vec<Frame>> {
    let len = frames.len();
    let last = &frames[len - 1];
    Ok(match mode {
        TemporalPadMode::Mirror | TemporalPadMode::Loop if len == 1 => vec![last.clone(); n],
        TemporalPadMode::Mirror => {
            let pingpong: Vec<&Frame> = frames[..len - 1].iter().rev().chain(&frames[1..]).collect();
            pingpong.into_iter().cycle().take(n).cloned().collect()
        }
        TemporalPadMode::Loop => frames.iter().cycle().take(n).cloned().collect(),
        TemporalPadMode::Repeat => vec![last.clone(); n],
        TemporalPadMode::Black | TemporalPadMode::Color(_) => vec![blank_frame(last, mode)?; n],
    })
}

/// `n` frames to place before `frames`.
fn start_frames(frames: &[Frame], n: usize, mode: &TemporalPadMode) -> TileResult<Vec<Frame>> {
    let len = frames.len();
    let first = &frames[0];
    Ok(match mode {
        TemporalPadMode::Mirror | TemporalPadMode::Loop if len == 1 => vec![first.clone(); n],
        TemporalPadMode::Mirror => {
            let pingpong: Vec<&Frame> = frames[1..].iter().chain(frames[..len - 1].iter().rev()).collect();
            let mut head: Vec<Frame> = pingpong.into_iter().cycle().take(n).cloned().collect();
            head.reverse();
            head
        }
        TemporalPadMode::Loop => {
            // the last n frames of the clip looped ceil(n / len) times
            let skip = n.div_ceil(len) * len - n;
            (skip..skip + n).map(|i| frames[i % len].clone()).collect()
        }
        TemporalPadMode::Repeat => vec![first.clone(); n],
        TemporalPadMode::Black | TemporalPadMode::Color(_) => vec![blank_frame(first, mode)?; n],
    })
}

/// Frames removed by [`trim`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrimSpec {
    /// Read the counts from the clip's temporal pad record
    #[default]
    Auto,
    /// Remove `start` frames from the start and `end` frames from the end
    Frames {
        /// Frames removed from the start
        start: usize,
        /// Frames removed from the end
        end: usize,
    },
    /// Keep exactly this many frames from the start
    Length(usize),
}

/// Remove temporal padding. The temporal pad record is removed in every mode.
pub fn trim(clip: &Clip, spec: TrimSpec) -> TileResult<Clip> {
    let length = clip.len();
    let (start, end) = match spec {
        TrimSpec::Auto => {
            let record = Tags::require(&clip.tags.temporal_pad)?;
            (record.start_pad, record.end_pad)
        }
        TrimSpec::Frames { start, end } => (start, end),
        TrimSpec::Length(keep) => {
            if keep < 1 {
                return Err(TileError::invalid("length", "length must be at least 1"));
            }
            if keep > length {
                return Err(TileError::invalid(
                    "length",
                    format!("length {} can not be larger than the clip length {}", keep, length),
                ));
            }
            (0, length - keep)
        }
    };

    let tags = Tags {
        temporal_pad: None,
        ..clip.tags.clone()
    };
    if start == 0 && end == 0 {
        return Ok(clip.clone().retag(tags));
    }
    if start + end >= length {
        return Err(TileError::TrimExceedsLength { start, end, length });
    }
    debug!("Trimming {} + {} frames from {}", start, end, length);
    clip.slice(start..length - end).map(|kept| kept.retag(tags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::FrameFormat;
    use crate::testing::{frame_ids, numbered_clip};

    fn frames(start: usize, end: usize) -> TemporalExtent {
        TemporalExtent::Frames { start, end }
    }

    #[test]
    fn test_mirror_ping_pongs_without_repeating_endpoints() {
        let clip = numbered_clip(FrameFormat::GRAY8, 3);
        let padded = tpad(&clip, frames(5, 5), &TemporalPadMode::Mirror).unwrap();
        assert_eq!(frame_ids(&padded), vec![1, 0, 1, 2, 1, 0, 1, 2, 1, 0, 1, 2, 1]);
        assert_eq!(
            padded.tags.temporal_pad,
            Some(TemporalPadRecord { start_pad: 5, end_pad: 5 })
        );
    }

    #[test]
    fn test_loop_wraps_around() {
        let clip = numbered_clip(FrameFormat::GRAY8, 3);
        let padded = tpad(&clip, frames(4, 4), &TemporalPadMode::Loop).unwrap();
        assert_eq!(frame_ids(&padded), vec![2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_single_frame_is_held() {
        let clip = numbered_clip(FrameFormat::GRAY8, 1);
        for mode in [TemporalPadMode::Mirror, TemporalPadMode::Loop, TemporalPadMode::Repeat] {
            let padded = tpad(&clip, frames(2, 1), &mode).unwrap();
            assert_eq!(frame_ids(&padded), vec![0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_repeat_and_blank_modes() {
        let clip = numbered_clip(FrameFormat::GRAY8, 3);
        let padded = tpad(&clip, frames(1, 2), &TemporalPadMode::Repeat).unwrap();
        assert_eq!(frame_ids(&padded), vec![0, 0, 1, 2, 2, 2]);

        let padded = tpad(&clip, frames(0, 2), &TemporalPadMode::Color(Color::gray(100.0))).unwrap();
        assert_eq!(frame_ids(&padded), vec![0, 1, 2, 100, 100]);

        let clip = numbered_clip(FrameFormat::YUV420P8, 2);
        let padded = tpad(&clip, frames(1, 0), &TemporalPadMode::Black).unwrap();
        assert_eq!(padded.frames()[0].get(0, 0, 0), 16.0);
        assert_eq!(padded.frames()[0].get(1, 0, 0), 128.0);
    }

    #[test]
    fn test_pad_to_length() {
        let clip = numbered_clip(FrameFormat::GRAY8, 3);
        let padded = tpad(&clip, TemporalExtent::Length(6), &TemporalPadMode::Repeat).unwrap();
        assert_eq!(frame_ids(&padded), vec![0, 1, 2, 2, 2, 2]);
        let unchanged = tpad(&clip, TemporalExtent::Length(2), &TemporalPadMode::Repeat).unwrap();
        assert_eq!(unchanged.len(), 3);
        assert!(tpad(&clip, TemporalExtent::Length(0), &TemporalPadMode::Repeat).is_err());
    }

    #[test]
    fn test_auto_trim_restores_clip() {
        let clip = numbered_clip(FrameFormat::GRAY8, 4);
        let padded = tpad(&clip, frames(3, 7), &TemporalPadMode::Mirror).unwrap();
        let trimmed = trim(&padded, TrimSpec::Auto).unwrap();
        assert_eq!(trimmed, clip);
    }

    #[test]
    fn test_manual_trim() {
        let clip = numbered_clip(FrameFormat::GRAY8, 6);
        let trimmed = trim(&clip, TrimSpec::Frames { start: 1, end: 2 }).unwrap();
        assert_eq!(frame_ids(&trimmed), vec![1, 2, 3]);
        let trimmed = trim(&clip, TrimSpec::Length(2)).unwrap();
        assert_eq!(frame_ids(&trimmed), vec![0, 1]);
        assert!(trim(&clip, TrimSpec::Length(7)).is_err());
        assert_eq!(
            trim(&clip, TrimSpec::Frames { start: 3, end: 3 }).unwrap_err(),
            TileError::TrimExceedsLength { start: 3, end: 3, length: 6 }
        );
    }

    #[test]
    fn test_auto_trim_needs_record() {
        let clip = numbered_clip(FrameFormat::GRAY8, 2);
        assert_eq!(
            trim(&clip, TrimSpec::Auto).unwrap_err(),
            TileError::MissingMetadata { record: "temporal pad" }
        );
    }

    #[test]
    fn test_mode_serde() {
        let mode: TemporalPadMode = serde_json::from_str(r#""loop""#).unwrap();
        assert_eq!(mode, TemporalPadMode::Loop);
        let mode: TemporalPadMode = serde_json::from_str("[128, 64, 64]").unwrap();
        assert_eq!(mode.tag(), "color");
        assert!("fsr".parse::<TemporalPadMode>().is_err());
    }
}
