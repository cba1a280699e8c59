//! Clips: ordered, non-empty frame sequences with typed metadata.

use crate::core::error::{TileError, TileResult};
use crate::core::format::FrameFormat;
use crate::core::frame::Frame;
use crate::core::metadata::Tags;
use std::ops::Range;

/// An ordered sequence of frames sharing one format and one size.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    frames: Vec<Frame>,
    /// Geometry records attached by partitioning calls
    pub tags: Tags,
}

impl Clip {
    /// Create an untagged clip.
    ///
    /// Fails when `frames` is empty or the frames disagree on format or size.
    pub fn new(frames: Vec<Frame>) -> TileResult<Self> {
        Self::with_tags(frames, Tags::default())
    }

    /// Create a clip carrying `tags`.
    pub fn with_tags(frames: Vec<Frame>, tags: Tags) -> TileResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| TileError::invalid("clip", "clip must contain at least one frame"))?;
        if let Some(index) = frames.iter().position(|f| !f.same_geometry(first)) {
            return Err(TileError::invalid(
                "clip",
                format!(
                    "frame {} is {}x{} {}, but the clip is {}x{} {}",
                    index,
                    frames[index].width(),
                    frames[index].height(),
                    frames[index].format(),
                    first.width(),
                    first.height(),
                    first.format()
                ),
            ));
        }
        Ok(Self { frames, tags })
    }

    /// A clip of `length` copies of `frame`.
    pub fn repeat_frame(frame: Frame, length: usize) -> TileResult<Self> {
        Self::new(vec![frame; length])
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; clips are never empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame format.
    pub fn format(&self) -> &FrameFormat {
        self.frames[0].format()
    }

    /// Frame width.
    pub fn width(&self) -> u32 {
        self.frames[0].width()
    }

    /// Frame height.
    pub fn height(&self) -> u32 {
        self.frames[0].height()
    }

    /// All frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// One frame.
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Take the frames out of the clip.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Check that `other` can be spliced onto this clip.
    pub fn same_geometry(&self, other: &Clip) -> bool {
        self.frames[0].same_geometry(&other.frames[0])
    }

    /// Same frames with different tags.
    pub fn retag(self, tags: Tags) -> Self {
        Self { frames: self.frames, tags }
    }

    /// Contiguous sub-range of frames, keeping the tags.
    pub fn slice(&self, range: Range<usize>) -> TileResult<Clip> {
        if range.start >= range.end || range.end > self.frames.len() {
            return Err(TileError::invalid(
                "range",
                format!(
                    "{}..{} is not a non-empty range of a {} frame clip",
                    range.start,
                    range.end,
                    self.frames.len()
                ),
            ));
        }
        Ok(Clip {
            frames: self.frames[range].to_vec(),
            tags: self.tags.clone(),
        })
    }

    /// Splice clips in order. The result carries the first clip's tags.
    pub fn concat(clips: &[Clip]) -> TileResult<Clip> {
        let first = clips
            .first()
            .ok_or_else(|| TileError::invalid("clips", "nothing to concatenate"))?;
        if clips.iter().any(|c| !c.same_geometry(first)) {
            return Err(TileError::invalid(
                "clips",
                "spliced clips must share format and dimensions",
            ));
        }
        let frames = clips.iter().flat_map(|c| c.frames.iter().cloned()).collect();
        Ok(Clip {
            frames,
            tags: first.tags.clone(),
        })
    }

    /// The clip played `times` times in a row.
    pub fn repeat(&self, times: usize) -> TileResult<Clip> {
        if times == 0 {
            return Err(TileError::invalid("times", "a clip must be repeated at least once"));
        }
        let frames = (0..times).flat_map(|_| self.frames.iter().cloned()).collect();
        Ok(Clip {
            frames,
            tags: self.tags.clone(),
        })
    }

    /// The clip played backwards.
    pub fn reverse(&self) -> Clip {
        Clip {
            frames: self.frames.iter().rev().cloned().collect(),
            tags: self.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::TemporalPadRecord;

    fn numbered(count: usize) -> Clip {
        let frames = (0..count)
            .map(|n| Frame::blank(FrameFormat::GRAY8, 4, 4, &[n as f64]).unwrap())
            .collect();
        Clip::new(frames).unwrap()
    }

    fn ids(clip: &Clip) -> Vec<u32> {
        clip.frames().iter().map(|f| f.get(0, 0, 0) as u32).collect()
    }

    #[test]
    fn test_rejects_empty_and_mixed() {
        assert!(Clip::new(Vec::new()).is_err());
        let a = Frame::black(FrameFormat::GRAY8, 4, 4).unwrap();
        let b = Frame::black(FrameFormat::GRAY8, 4, 6).unwrap();
        assert!(Clip::new(vec![a, b]).is_err());
    }

    #[test]
    fn test_slice_concat_repeat_reverse() {
        let clip = numbered(5);
        assert_eq!(ids(&clip.slice(1..3).unwrap()), vec![1, 2]);
        assert!(clip.slice(3..3).is_err());
        assert!(clip.slice(4..6).is_err());

        let joined = Clip::concat(&[clip.slice(0..2).unwrap(), clip.slice(4..5).unwrap()]).unwrap();
        assert_eq!(ids(&joined), vec![0, 1, 4]);
        assert_eq!(ids(&joined.repeat(2).unwrap()), vec![0, 1, 4, 0, 1, 4]);
        assert_eq!(ids(&joined.reverse()), vec![4, 1, 0]);
    }

    #[test]
    fn test_concat_keeps_first_tags() {
        let mut first = numbered(2);
        first.tags.temporal_pad = Some(TemporalPadRecord { start_pad: 1, end_pad: 0 });
        let joined = Clip::concat(&[first.clone(), numbered(3)]).unwrap();
        assert_eq!(joined.len(), 5);
        assert_eq!(joined.tags, first.tags);
    }
}
