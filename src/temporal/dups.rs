//! Skipping near-duplicate frames around expensive processing.
//!
//! [`mark_dups`] measures every frame against its predecessor and records,
//! per frame, how many frames back an equivalent frame exists. The caller
//! processes the clip (ideally lazily) and hands the result to [`skip_dups`],
//! which replaces each marked frame by an earlier processed one.

use crate::core::clip::Clip;
use crate::core::collab::FrameDiff;
use crate::core::error::{TileError, TileResult};
use log::debug;
use rayon::prelude::*;

/// Longest run of frames that may copy an earlier frame.
pub const MAX_SKIP: usize = 5;

/// Threshold scale applied before comparing differences.
const THRESHOLD_SCALE: f64 = 10.0;

/// Duplicate marks of one [`mark_dups`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DupHandle {
    id: u64,
    marks: Vec<usize>,
}

impl DupHandle {
    /// Identifier unique within the session that created the handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Per frame, the length of the duplicate run ending there (at most [`MAX_SKIP`]).
    pub fn marks(&self) -> &[usize] {
        &self.marks
    }

    /// Number of marked frames.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Check if the handle covers no frames.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Mark frames that barely differ from the frames before them.
///
/// `thresh` is scaled by 10; a frame counts as duplicate of its predecessor
/// when their difference is strictly below the scaled value.
pub(crate) fn mark_dups(clip: &Clip, thresh: f64, diff: &dyn FrameDiff, id: u64) -> TileResult<(Clip, DupHandle)> {
    if !(thresh >= 0.0) {
        return Err(TileError::NegativeValue {
            parameter: "Threshold",
            value: thresh,
        });
    }
    let limit = thresh * THRESHOLD_SCALE;
    let frames = clip.frames();

    let mut diffs = vec![0.0];
    diffs.extend(
        frames
            .par_windows(2)
            .map(|pair| diff.difference(&pair[0], &pair[1]))
            .collect::<TileResult<Vec<_>>>()?,
    );

    let marks: Vec<usize> = (0..frames.len())
        .map(|n| (0..MAX_SKIP).take_while(|&i| n > i && diffs[n - i] < limit).count())
        .collect();
    debug!(
        "Marked {} of {} frames as duplicates (handle {})",
        marks.iter().filter(|&&m| m > 0).count(),
        frames.len(),
        id
    );
    Ok((clip.clone(), DupHandle { id, marks }))
}

/// Replace marked frames of `processed` with earlier processed frames.
///
/// Runs shorter than [`MAX_SKIP`] all copy the frame before the run. In
/// longer runs the offset cycles with the frame number, so the copied frame
/// moves forward every [`MAX_SKIP`] frames.
pub fn skip_dups(processed: &Clip, handle: &DupHandle) -> TileResult<Clip> {
    if processed.len() != handle.len() {
        return Err(TileError::invalid(
            "clip",
            format!(
                "frame count changed between mark_dups ({}) and skip_dups ({})",
                handle.len(),
                processed.len()
            ),
        ));
    }
    let source = processed.frames();
    let frames = handle
        .marks
        .iter()
        .enumerate()
        .map(|(n, &mark)| {
            let back = if mark < MAX_SKIP { mark } else { n % MAX_SKIP };
            source[n - back].clone()
        })
        .collect();
    Clip::with_tags(frames, processed.tags.clone())
}
