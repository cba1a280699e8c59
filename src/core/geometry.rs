//! Integer geometry shared by spatial and temporal partitioning.
//!
//! Everything in this module is pure arithmetic: strides, chunk counts,
//! overlap splitting, alignment and rescaling. No function here touches
//! pixel data.
//!
//! # Rounding
//!
//! [`rescale`] rounds half up. Alignment truncation ([`align_down`]) always
//! floors. No other rounding rule is used anywhere in the crate.

use crate::core::error::{TileError, TileResult};
use crate::core::format::FrameFormat;
use serde::{Deserialize, Serialize};

/// Upper bound on tiles per frame or windows per clip.
pub const MAX_CHUNKS: usize = 1024;

/// Represents a rectangular region within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    /// X offset from the frame origin
    pub x: u32,
    /// Y offset from the frame origin
    pub y: u32,
    /// Width of the region
    pub width: u32,
    /// Height of the region
    pub height: u32,
}

impl TileRegion {
    /// Create a new tile region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Get the right edge coordinate (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Get the bottom edge coordinate (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Check if this region is entirely within the given bounds.
    pub fn is_within_bounds(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Border sizes on the four sides of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    /// Pixels on the left.
    pub left: u32,
    /// Pixels on the right.
    pub right: u32,
    /// Pixels on the top.
    pub top: u32,
    /// Pixels on the bottom.
    pub bottom: u32,
}

impl Margins {
    /// Create margins.
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }

    /// Same margin on all sides.
    pub fn uniform(size: u32) -> Self {
        Self::new(size, size, size, size)
    }

    /// Check if all four margins are zero.
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }

    /// Sum of left and right, saturating at `u32::MAX`.
    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }

    /// Sum of top and bottom, saturating at `u32::MAX`.
    pub fn vertical(&self) -> u32 {
        self.top.saturating_add(self.bottom)
    }

    /// Size of a `width x height` frame grown by these margins.
    ///
    /// Fails with [`TileError::InvalidInput`] when a dimension does not fit
    /// into `u32`.
    pub fn padded_size(&self, width: u32, height: u32) -> TileResult<(u32, u32)> {
        let grow = |extent: u32, near: u32, far: u32| extent.checked_add(near)?.checked_add(far);
        match (
            grow(width, self.left, self.right),
            grow(height, self.top, self.bottom),
        ) {
            (Some(padded_w), Some(padded_h)) => Ok((padded_w, padded_h)),
            _ => Err(TileError::invalid(
                "margins",
                format!("{}x{} grown by {:?} overflows the frame size", width, height, self),
            )),
        }
    }

    /// Reject margins that would split a subsampled chroma sample.
    pub fn check_alignment(&self, format: &FrameFormat, what: &str) -> TileResult<()> {
        let sides = [
            (self.left, format.sub_w(), "Left"),
            (self.right, format.sub_w(), "Right"),
            (self.top, format.sub_h(), "Top"),
            (self.bottom, format.sub_h(), "Bottom"),
        ];
        for (value, unit, side) in sides {
            if unit > 1 && value % unit != 0 {
                return Err(TileError::UnalignedValue {
                    parameter: side_parameter(side, what),
                    value: value as u64,
                    alignment: unit,
                    format: format.name(),
                });
            }
        }
        Ok(())
    }
}

fn side_parameter(side: &str, what: &str) -> &'static str {
    match (side, what) {
        ("Left", "crop") => "Left crop",
        ("Right", "crop") => "Right crop",
        ("Top", "crop") => "Top crop",
        ("Bottom", "crop") => "Bottom crop",
        ("Left", "fill") => "Left maximum",
        ("Right", "fill") => "Right maximum",
        ("Top", "fill") => "Top maximum",
        ("Bottom", "fill") => "Bottom maximum",
        ("Left", _) => "Left padding",
        ("Right", _) => "Right padding",
        ("Top", _) => "Top padding",
        _ => "Bottom padding",
    }
}

/// Distance between the starts of consecutive chunks.
///
/// Fails with [`TileError::InvalidOverlap`] unless `overlap < size`.
pub fn stride(size: u32, overlap: u32) -> TileResult<u32> {
    if overlap >= size {
        return Err(TileError::InvalidOverlap {
            parameter: "overlap",
            overlap: overlap as u64,
            size: size as u64,
        });
    }
    Ok(size - overlap)
}

/// Number of chunks needed to cover `total` starting at 0.
pub fn chunk_count(total: u32, chunk: u32, stride: u32) -> u32 {
    if total <= chunk {
        1
    } else {
        1 + (total - chunk).div_ceil(stride)
    }
}

/// Number of whole chunks that fit into `total` without exceeding it.
///
/// Returns 0 when not even one chunk fits.
pub fn exact_chunk_count(total: u32, chunk: u32, stride: u32) -> u32 {
    if total < chunk {
        0
    } else {
        1 + (total - chunk) / stride
    }
}

/// Extent spanned by `count` chunks placed `stride` apart.
pub fn assembled_extent(chunk: u32, stride: u32, count: u32) -> u32 {
    chunk + count.saturating_sub(1) * stride
}

/// Split an overlap into a near and a far half, both aligned.
///
/// The overlap is first truncated to a multiple of `alignment`; the near half
/// is half of that, truncated again, and the far half takes the rest.
pub fn split_overlap(overlap: u32, alignment: u32) -> (u32, u32) {
    if overlap == 0 {
        return (0, 0);
    }
    let overlap = align_down(overlap, alignment);
    let near = align_down(overlap / 2, alignment);
    (near, overlap - near)
}

/// Scale `value` by `to / from`, rounding half up.
pub fn rescale(value: u32, from: u32, to: u32) -> u32 {
    if from == 0 || from == to {
        return value;
    }
    let numerator = 2 * value as u64 * to as u64 + from as u64;
    (numerator / (2 * from as u64)) as u32
}

/// Largest multiple of `alignment` not greater than `value`.
pub fn align_down(value: u32, alignment: u32) -> u32 {
    if alignment <= 1 {
        value
    } else {
        value - value % alignment
    }
}

/// Fail with [`TileError::UnalignedValue`] unless `value` is a multiple of `alignment`.
pub fn check_alignment(
    value: u64,
    alignment: u32,
    parameter: &'static str,
    format: &FrameFormat,
) -> TileResult<()> {
    if alignment > 1 && value % alignment as u64 != 0 {
        return Err(TileError::UnalignedValue {
            parameter,
            value,
            alignment,
            format: format.name(),
        });
    }
    Ok(())
}

/// Fail with [`TileError::TooManyChunks`] when `count` exceeds [`MAX_CHUNKS`].
pub fn check_chunk_limit(count: usize) -> TileResult<()> {
    if count > MAX_CHUNKS {
        return Err(TileError::TooManyChunks {
            count,
            max: MAX_CHUNKS,
        });
    }
    Ok(())
}

/// A grid of equally sized, overlapping tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Tile width
    pub tile_w: u32,
    /// Tile height
    pub tile_h: u32,
    /// Horizontal overlap between neighbouring tiles
    pub overlap_w: u32,
    /// Vertical overlap between neighbouring tiles
    pub overlap_h: u32,
    /// Tiles per row
    pub tiles_x: u32,
    /// Tiles per column
    pub tiles_y: u32,
}

impl GridLayout {
    /// Grid covering `width x height`, growing past the edge where needed.
    pub fn covering(width: u32, height: u32, tile_w: u32, tile_h: u32, overlap_w: u32, overlap_h: u32) -> TileResult<Self> {
        let stride_x = stride(tile_w, overlap_w)?;
        let stride_y = stride(tile_h, overlap_h)?;
        let layout = Self {
            tile_w,
            tile_h,
            overlap_w,
            overlap_h,
            tiles_x: chunk_count(width, tile_w, stride_x),
            tiles_y: chunk_count(height, tile_h, stride_y),
        };
        check_chunk_limit(layout.tile_count())?;
        Ok(layout)
    }

    /// Largest grid that fits inside `width x height` without padding.
    pub fn exact(width: u32, height: u32, tile_w: u32, tile_h: u32, overlap_w: u32, overlap_h: u32) -> TileResult<Self> {
        if width < tile_w || height < tile_h {
            return Err(TileError::invalid(
                "tile size",
                format!(
                    "tile size {}x{} must not exceed frame size {}x{}",
                    tile_w, tile_h, width, height
                ),
            ));
        }
        let stride_x = stride(tile_w, overlap_w)?;
        let stride_y = stride(tile_h, overlap_h)?;
        let layout = Self {
            tile_w,
            tile_h,
            overlap_w,
            overlap_h,
            tiles_x: exact_chunk_count(width, tile_w, stride_x),
            tiles_y: exact_chunk_count(height, tile_h, stride_y),
        };
        check_chunk_limit(layout.tile_count())?;
        Ok(layout)
    }

    /// Horizontal stride.
    pub fn stride_x(&self) -> u32 {
        self.tile_w - self.overlap_w
    }

    /// Vertical stride.
    pub fn stride_y(&self) -> u32 {
        self.tile_h - self.overlap_h
    }

    /// Tiles per frame.
    pub fn tile_count(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Width spanned by the whole grid.
    pub fn assembled_width(&self) -> u32 {
        assembled_extent(self.tile_w, self.stride_x(), self.tiles_x)
    }

    /// Height spanned by the whole grid.
    pub fn assembled_height(&self) -> u32 {
        assembled_extent(self.tile_h, self.stride_y(), self.tiles_y)
    }

    /// Region of the tile at `index` in row-major order.
    pub fn region(&self, index: usize) -> TileRegion {
        let col = (index % self.tiles_x as usize) as u32;
        let row = (index / self.tiles_x as usize) as u32;
        TileRegion::new(col * self.stride_x(), row * self.stride_y(), self.tile_w, self.tile_h)
    }

    /// Iterate over all tile regions in row-major order.
    pub fn regions(&self) -> impl Iterator<Item = TileRegion> + '_ {
        (0..self.tile_count()).map(move |index| self.region(index))
    }
}
