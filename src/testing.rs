//! Test helpers: deterministic clips and in-memory collaborators.

use crate::core::clip::Clip;
use crate::core::collab::{BorderDetect, BorderFill, Collaborators, FillMode, FrameDiff, Outpaint, OutpaintAlgorithm};
use crate::core::error::{TileError, TileResult};
use crate::core::format::{ColorFamily, FrameFormat};
use crate::core::frame::Frame;
use crate::core::geometry::Margins;

/// Install the test logger once.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A frame whose samples depend on position, plane and `seed`, within 8 bits.
pub fn gradient_frame(format: FrameFormat, width: u32, height: u32, seed: u32) -> Frame {
    let peak = format.peak();
    Frame::from_fn(format, width, height, |plane, x, y| {
        let value = ((x * 7 + y * 13 + plane as u32 * 31 + seed * 17) % 251) as f64;
        if format.is_integer() {
            value
        } else {
            value / 255.0 * peak
        }
    })
    .unwrap()
}

/// A clip of `length` distinct gradient frames.
pub fn gradient_clip(format: FrameFormat, width: u32, height: u32, length: usize) -> Clip {
    let frames = (0..length as u32)
        .map(|seed| gradient_frame(format, width, height, seed))
        .collect();
    Clip::new(frames).unwrap()
}

/// A clip whose frame `n` is filled with the value `n`.
pub fn numbered_clip(format: FrameFormat, length: usize) -> Clip {
    let frames = (0..length)
        .map(|n| Frame::blank(format, 4, 4, &[n as f64]).unwrap())
        .collect();
    Clip::new(frames).unwrap()
}

/// Values of the top-left luma sample of every frame.
pub fn frame_ids(clip: &Clip) -> Vec<u32> {
    clip.frames().iter().map(|f| f.get(0, 0, 0) as u32).collect()
}

fn plane_shift(format: &FrameFormat, plane: usize) -> (u32, u32) {
    if plane > 0 && format.color_family == ColorFamily::Yuv {
        (format.subsampling_w as u32, format.subsampling_h as u32)
    } else {
        (0, 0)
    }
}

fn reflect(pos: i64, len: i64, mode: FillMode) -> u32 {
    let index = match mode {
        FillMode::Mirror if pos < 0 => -pos - 1,
        FillMode::Mirror if pos >= len => 2 * len - pos - 1,
        _ => pos,
    };
    index.clamp(0, len - 1) as u32
}

/// Border fill that mirrors (edge included) or replicates the edge.
#[derive(Debug, Clone, Copy)]
pub struct MirrorFill;

impl BorderFill for MirrorFill {
    fn fill(&self, frame: &Frame, margins: Margins, mode: FillMode) -> TileResult<Frame> {
        let format = *frame.format();
        Frame::from_fn(
            format,
            frame.width() + margins.horizontal(),
            frame.height() + margins.vertical(),
            |plane, x, y| {
                let (sw, sh) = plane_shift(&format, plane);
                let source = frame.plane(plane);
                let sx = reflect(x as i64 - (margins.left >> sw) as i64, source.width() as i64, mode);
                let sy = reflect(y as i64 - (margins.top >> sh) as i64, source.height() as i64, mode);
                source.get(sx, sy)
            },
        )
    }
}

/// Outpaint that paints masked pixels mid gray and leaves the rest.
#[derive(Debug, Clone, Copy)]
pub struct FlatOutpaint;

impl Outpaint for FlatOutpaint {
    fn outpaint(&self, frame: &Frame, mask: &Frame, _algorithm: OutpaintAlgorithm) -> TileResult<Frame> {
        if mask.width() != frame.width() || mask.height() != frame.height() {
            return Err(TileError::invalid("mask", "mask does not match the frame"));
        }
        let format = *frame.format();
        let middle = if format.is_integer() { (format.peak() / 2.0).round() } else { 0.5 };
        Frame::from_fn(format, frame.width(), frame.height(), |plane, x, y| {
            let (sw, sh) = plane_shift(&format, plane);
            if mask.get(0, x << sw, y << sh) > 0.0 {
                middle
            } else {
                frame.get(plane, x, y)
            }
        })
    }
}

/// Border detection returning the same margins for every frame.
#[derive(Debug, Clone, Copy)]
pub struct FixedBorders(pub Margins);

impl BorderDetect for FixedBorders {
    fn detect(&self, _frame: &Frame, _low: [u8; 3], _high: [u8; 3], max: Margins) -> TileResult<Margins> {
        Ok(Margins::new(
            self.0.left.min(max.left),
            self.0.right.min(max.right),
            self.0.top.min(max.top),
            self.0.bottom.min(max.bottom),
        ))
    }
}

/// Mean absolute difference of the first plane.
#[derive(Debug, Clone, Copy)]
pub struct MeanDiff;

impl FrameDiff for MeanDiff {
    fn difference(&self, previous: &Frame, current: &Frame) -> TileResult<f64> {
        let plane = previous.plane(0);
        let mut total = 0.0;
        for y in 0..plane.height() {
            for x in 0..plane.width() {
                total += (previous.get(0, x, y) - current.get(0, x, y)).abs();
            }
        }
        Ok(total / (plane.width() * plane.height()) as f64)
    }
}

/// Every mock collaborator.
pub fn test_collaborators() -> Collaborators {
    Collaborators::new()
        .with_border_fill(MirrorFill)
        .with_outpaint(FlatOutpaint)
        .with_frame_diff(MeanDiff)
}
