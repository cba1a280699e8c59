//! Spatial tiling and reassembly.
//!
//! [`tile`] cuts every frame into a row-major grid of equally sized,
//! overlapping tiles. The output clip interleaves them: source frame `n`
//! becomes frames `n * count .. (n + 1) * count`, tile `row * tiles_x + col`
//! at offset `row * tiles_x + col`. [`untile`] relies on exactly this
//! packing.
//!
//! Seams are resolved either by cropping half of each overlap from both
//! neighbours, or by blending the full overlap through a gradient mask.

use crate::core::clip::Clip;
use crate::core::collab::Collaborators;
use crate::core::error::{TileError, TileResult};
use crate::core::format::FrameFormat;
use crate::core::frame::Frame;
use crate::core::geometry::{align_down, check_alignment, rescale, split_overlap, GridLayout, Margins, TileRegion};
use crate::core::merge::{masked_merge, Axis, MaskCache};
use crate::core::metadata::{Tags, TileRecord};
use crate::spatial::pad::{pad_frames, PadMode, TilePadding};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Tile geometry and edge policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSpec {
    /// Tile width
    pub width: u32,
    /// Tile height
    pub height: u32,
    /// Horizontal overlap between neighbouring tiles
    pub overlap_w: u32,
    /// Vertical overlap between neighbouring tiles
    pub overlap_h: u32,
    /// What happens to tiles that would reach past the frame
    pub padding: TilePadding,
}

impl Default for TileSpec {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            overlap_w: 16,
            overlap_h: 16,
            padding: TilePadding::Pad(PadMode::Mirror),
        }
    }
}

impl TileSpec {
    /// Tiles of `width x height` with the default overlap and padding.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Same overlap on both axes.
    pub fn overlap(mut self, overlap: u32) -> Self {
        self.overlap_w = overlap;
        self.overlap_h = overlap;
        self
    }

    /// Separate horizontal and vertical overlap.
    pub fn overlap_xy(mut self, overlap_w: u32, overlap_h: u32) -> Self {
        self.overlap_w = overlap_w;
        self.overlap_h = overlap_h;
        self
    }

    /// Set the edge policy.
    pub fn padding(mut self, padding: TilePadding) -> Self {
        self.padding = padding;
        self
    }

    fn validate(&self, format: &FrameFormat) -> TileResult<()> {
        if self.width <= 1 || self.height <= 1 {
            return Err(TileError::invalid(
                "tile size",
                format!("tile width and height must be larger than 1, got {}x{}", self.width, self.height),
            ));
        }
        if self.overlap_w >= self.width {
            return Err(TileError::InvalidOverlap {
                parameter: "overlap_w",
                overlap: self.overlap_w as u64,
                size: self.width as u64,
            });
        }
        if self.overlap_h >= self.height {
            return Err(TileError::InvalidOverlap {
                parameter: "overlap_h",
                overlap: self.overlap_h as u64,
                size: self.height as u64,
            });
        }
        check_alignment(self.width as u64, format.sub_w(), "Width", format)?;
        check_alignment(self.height as u64, format.sub_h(), "Height", format)?;
        check_alignment(self.overlap_w as u64, format.sub_w(), "Overlap", format)?;
        check_alignment(self.overlap_h as u64, format.sub_h(), "Overlap", format)
    }
}

/// Split every frame into a grid of overlapping tiles.
pub fn tile(clip: &Clip, spec: &TileSpec, collaborators: &Collaborators) -> TileResult<Clip> {
    let format = *clip.format();
    spec.validate(&format)?;
    let (width, height) = (clip.width(), clip.height());
    let discarded = spec.padding == TilePadding::Discard;

    let (grid, frames) = match &spec.padding {
        TilePadding::Discard => {
            let grid = GridLayout::exact(width, height, spec.width, spec.height, spec.overlap_w, spec.overlap_h)?;
            let used = TileRegion::new(0, 0, grid.assembled_width(), grid.assembled_height());
            let frames = if used.width == width && used.height == height {
                clip.frames().to_vec()
            } else {
                debug!(
                    "Discarding {}x{} of {}x{} that no full tile covers",
                    width - used.width,
                    height - used.height,
                    width,
                    height
                );
                clip.frames()
                    .par_iter()
                    .map(|frame| frame.crop_region(used))
                    .collect::<TileResult<Vec<_>>>()?
            };
            (grid, frames)
        }
        TilePadding::Pad(mode) => {
            let grid = GridLayout::covering(width, height, spec.width, spec.height, spec.overlap_w, spec.overlap_h)?;
            let margins = Margins::new(0, grid.assembled_width() - width, 0, grid.assembled_height() - height);
            (grid, pad_frames(clip, margins, mode, collaborators)?)
        }
    };
    debug!(
        "Tiling {} frames of {}x{} into {}x{} tiles of {}x{} (overlap {}x{})",
        clip.len(),
        width,
        height,
        grid.tiles_x,
        grid.tiles_y,
        spec.width,
        spec.height,
        spec.overlap_w,
        spec.overlap_h
    );

    let tiles = frames
        .par_iter()
        .map(|frame| grid.regions().map(|region| frame.crop_region(region)).collect::<TileResult<Vec<_>>>())
        .collect::<TileResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    let tags = Tags {
        tile: Some(TileRecord {
            tile_w: spec.width,
            tile_h: spec.height,
            overlap_w: spec.overlap_w,
            overlap_h: spec.overlap_h,
            orig_w: width,
            orig_h: height,
            discarded,
        }),
        ..clip.tags.clone()
    };
    Clip::with_tags(tiles, tags)
}

/// Reassembly options.
///
/// Leave all of `full_width`, `full_height` and `overlap` unset to read the
/// geometry from the clip's tile record, or set all three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UntileOptions {
    /// Blend overlaps instead of cropping them
    pub fade: bool,
    /// Width of the reassembled frame
    pub full_width: Option<u32>,
    /// Height of the reassembled frame
    pub full_height: Option<u32>,
    /// Overlap (horizontal, vertical) between tiles
    pub overlap: Option<(u32, u32)>,
}

impl UntileOptions {
    /// Auto mode with cropped seams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blend or crop the seams.
    pub fn fade(mut self, fade: bool) -> Self {
        self.fade = fade;
        self
    }

    /// Manual geometry.
    pub fn manual(mut self, full_width: u32, full_height: u32, overlap: (u32, u32)) -> Self {
        self.full_width = Some(full_width);
        self.full_height = Some(full_height);
        self.overlap = Some(overlap);
        self
    }
}

/// Resolved reassembly geometry.
#[derive(Debug, Clone, Copy)]
struct Assembly {
    grid: GridLayout,
    pad_right: u32,
    pad_bottom: u32,
}

fn covering_assembly(full_w: u32, full_h: u32, tile_w: u32, tile_h: u32, overlap_w: u32, overlap_h: u32) -> TileResult<Assembly> {
    let grid = GridLayout::covering(full_w, full_h, tile_w, tile_h, overlap_w, overlap_h)?;
    Ok(Assembly {
        grid,
        pad_right: grid.assembled_width().saturating_sub(full_w),
        pad_bottom: grid.assembled_height().saturating_sub(full_h),
    })
}

fn manual_assembly(clip: &Clip, full_w: u32, full_h: u32, overlap: (u32, u32)) -> TileResult<Assembly> {
    let format = clip.format();
    let (tile_w, tile_h) = (clip.width(), clip.height());
    let (overlap_w, overlap_h) = overlap;
    if overlap_w >= tile_w || overlap_h >= tile_h {
        return Err(TileError::InvalidOverlap {
            parameter: "overlap",
            overlap: overlap_w.max(overlap_h) as u64,
            size: (if overlap_w >= tile_w { tile_w } else { tile_h }) as u64,
        });
    }
    if full_w == 0 || full_h == 0 {
        return Err(TileError::invalid("full size", "full width and height must be positive"));
    }
    check_alignment(overlap_w as u64, format.sub_w(), "Overlap", format)?;
    check_alignment(overlap_h as u64, format.sub_h(), "Overlap", format)?;
    check_alignment(full_w as u64, format.sub_w(), "Full width", format)?;
    check_alignment(full_h as u64, format.sub_h(), "Full height", format)?;
    covering_assembly(full_w, full_h, tile_w, tile_h, overlap_w, overlap_h)
}

/// Largest aligned overlap that still leaves a positive stride.
fn clamp_overlap(overlap: u32, tile: u32, alignment: u32) -> u32 {
    overlap.min(align_down(tile - 1, alignment))
}

fn auto_assembly(clip: &Clip) -> TileResult<Assembly> {
    let record = Tags::require(&clip.tags.tile)?;
    if record.tile_w == 0 || record.tile_h == 0 {
        return Err(TileError::CorruptMetadata {
            record: "tile",
            reason: "tile size is zero".to_string(),
        });
    }
    let format = clip.format();
    let (sub_w, sub_h) = (format.sub_w(), format.sub_h());
    let (tile_w, tile_h) = (clip.width(), clip.height());

    let full_w = align_down(rescale(record.orig_w, record.tile_w, tile_w), sub_w);
    let full_h = align_down(rescale(record.orig_h, record.tile_h, tile_h), sub_h);
    let scaled_w = align_down(rescale(record.overlap_w, record.tile_w, tile_w), sub_w);
    let scaled_h = align_down(rescale(record.overlap_h, record.tile_h, tile_h), sub_h);
    let overlap_w = clamp_overlap(scaled_w, tile_w, sub_w);
    let overlap_h = clamp_overlap(scaled_h, tile_h, sub_h);
    if (overlap_w, overlap_h) != (scaled_w, scaled_h) {
        warn!(
            "Rescaled overlap {}x{} does not fit {}x{} tiles, clamped to {}x{}",
            scaled_w, scaled_h, tile_w, tile_h, overlap_w, overlap_h
        );
    }
    debug!(
        "Auto untile: recorded {}x{} tiles of a {}x{} frame, now {}x{} tiles of {}x{} (overlap {}x{})",
        record.tile_w, record.tile_h, record.orig_w, record.orig_h, tile_w, tile_h, full_w, full_h, overlap_w, overlap_h
    );

    if record.discarded {
        let grid = GridLayout::exact(full_w, full_h, tile_w, tile_h, overlap_w, overlap_h)?;
        Ok(Assembly {
            grid,
            pad_right: 0,
            pad_bottom: 0,
        })
    } else {
        covering_assembly(full_w, full_h, tile_w, tile_h, overlap_w, overlap_h)
    }
}

/// Reassemble frames from a tiled clip.
///
/// Fails with [`TileError::IncompleteParameters`] when only part of the
/// manual geometry is given, and with [`TileError::ChunkCountMismatch`] when
/// the clip length is not a multiple of the tiles per frame.
pub fn untile(clip: &Clip, options: &UntileOptions) -> TileResult<Clip> {
    let assembly = match (options.full_width, options.full_height, options.overlap) {
        (None, None, None) => auto_assembly(clip)?,
        (Some(full_w), Some(full_h), Some(overlap)) => manual_assembly(clip, full_w, full_h, overlap)?,
        _ => {
            return Err(TileError::IncompleteParameters {
                operation: "untile",
                expected: "'full_width', 'full_height' and 'overlap'",
            })
        }
    };
    let grid = assembly.grid;
    let count = grid.tile_count();
    if clip.len() % count != 0 {
        return Err(TileError::ChunkCountMismatch {
            frames: clip.len(),
            chunks: count,
        });
    }

    let format = *clip.format();
    let mut masks = MaskCache::new(format);
    if options.fade {
        if grid.overlap_w > 0 {
            masks.get(Axis::Horizontal, grid.overlap_w, grid.tile_h)?;
        }
        if grid.overlap_h > 0 {
            masks.get(Axis::Vertical, grid.overlap_h, grid.assembled_width())?;
        }
    }
    let masks = &masks;

    let output_size = TileRegion::new(
        0,
        0,
        grid.assembled_width() - assembly.pad_right,
        grid.assembled_height() - assembly.pad_bottom,
    );
    let frames = clip
        .frames()
        .par_chunks(count)
        .map(|tiles| {
            let full = if options.fade {
                blend_grid(tiles, &grid, masks)?
            } else {
                crop_grid(tiles, &grid, &format)?
            };
            full.crop_region(output_size)
        })
        .collect::<TileResult<Vec<_>>>()?;

    let tags = Tags {
        tile: None,
        ..clip.tags.clone()
    };
    Clip::with_tags(frames, tags)
}

/// Crop half of every shared overlap and stack.
fn crop_grid(tiles: &[Frame], grid: &GridLayout, format: &FrameFormat) -> TileResult<Frame> {
    let (near_w, far_w) = split_overlap(grid.overlap_w, format.sub_w());
    let (near_h, far_h) = split_overlap(grid.overlap_h, format.sub_h());
    let (last_col, last_row) = (grid.tiles_x - 1, grid.tiles_y - 1);

    let rows = (0..grid.tiles_y)
        .map(|row| {
            let row_tiles = (0..grid.tiles_x)
                .map(|col| {
                    let margins = Margins::new(
                        if col > 0 { near_w } else { 0 },
                        if col < last_col { far_w } else { 0 },
                        if row > 0 { near_h } else { 0 },
                        if row < last_row { far_h } else { 0 },
                    );
                    let tile = &tiles[(row * grid.tiles_x + col) as usize];
                    if margins.is_zero() {
                        Ok(tile.clone())
                    } else {
                        tile.crop_margins(margins)
                    }
                })
                .collect::<TileResult<Vec<_>>>()?;
            Frame::stack_horizontal(&row_tiles)
        })
        .collect::<TileResult<Vec<_>>>()?;
    Frame::stack_vertical(&rows)
}

/// Blend neighbours across their full overlap, rows first.
fn blend_grid(tiles: &[Frame], grid: &GridLayout, masks: &MaskCache) -> TileResult<Frame> {
    let mut rows = Vec::with_capacity(grid.tiles_y as usize);
    for row in 0..grid.tiles_y {
        let start = (row * grid.tiles_x) as usize;
        let mut merged = tiles[start].clone();
        for next in &tiles[start + 1..start + grid.tiles_x as usize] {
            merged = blend_pair(&merged, next, Axis::Horizontal, grid.overlap_w, masks)?;
        }
        rows.push(merged);
    }
    let mut full = rows[0].clone();
    for next in &rows[1..] {
        full = blend_pair(&full, next, Axis::Vertical, grid.overlap_h, masks)?;
    }
    Ok(full)
}

fn blend_pair(first: &Frame, second: &Frame, axis: Axis, overlap: u32, masks: &MaskCache) -> TileResult<Frame> {
    match axis {
        Axis::Horizontal => {
            if overlap == 0 {
                return Frame::stack_horizontal(&[first.clone(), second.clone()]);
            }
            let height = first.height();
            let keep_first = first.crop_region(TileRegion::new(0, 0, first.width() - overlap, height))?;
            let tail = first.crop_region(TileRegion::new(first.width() - overlap, 0, overlap, height))?;
            let head = second.crop_region(TileRegion::new(0, 0, overlap, height))?;
            let keep_second = second.crop_region(TileRegion::new(overlap, 0, second.width() - overlap, height))?;
            let seam = masked_merge(&tail, &head, masks.lookup(axis, overlap, height)?)?;
            Frame::stack_horizontal(&[keep_first, seam, keep_second])
        }
        Axis::Vertical => {
            if overlap == 0 {
                return Frame::stack_vertical(&[first.clone(), second.clone()]);
            }
            let width = first.width();
            let keep_first = first.crop_region(TileRegion::new(0, 0, width, first.height() - overlap))?;
            let tail = first.crop_region(TileRegion::new(0, first.height() - overlap, width, overlap))?;
            let head = second.crop_region(TileRegion::new(0, 0, width, overlap))?;
            let keep_second = second.crop_region(TileRegion::new(0, overlap, width, second.height() - overlap))?;
            let seam = masked_merge(&tail, &head, masks.lookup(axis, overlap, width)?)?;
            Frame::stack_vertical(&[keep_first, seam, keep_second])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::PadRecord;
    use crate::spatial::pad::{crop, pad, CropMargins};
    use crate::testing::{gradient_clip, gradient_frame, init_logging, test_collaborators};
    use proptest::prelude::*;

    fn black_tiles(width: u32, height: u32) -> TileSpec {
        TileSpec::new(width, height).padding(TilePadding::Pad(PadMode::Black))
    }

    #[test]
    fn test_tile_512_into_four() {
        init_logging();
        let clip = gradient_clip(FrameFormat::YUV420P8, 512, 512, 1);
        let tiled = tile(&clip, &black_tiles(256, 256).overlap(0), &Collaborators::new()).unwrap();
        assert_eq!(tiled.len(), 4);
        let source = &clip.frames()[0];
        for (index, (x, y)) in [(0, 0), (256, 0), (0, 256), (256, 256)].into_iter().enumerate() {
            let expected = source.crop_region(TileRegion::new(x, y, 256, 256)).unwrap();
            assert_eq!(tiled.frames()[index], expected);
        }

        let full = untile(&tiled, &UntileOptions::new()).unwrap();
        assert_eq!((full.width(), full.height()), (512, 512));
        assert_eq!(full.frames(), clip.frames());
        assert!(full.tags.tile.is_none());
    }

    #[test]
    fn test_tile_rejects_full_overlap() {
        let clip = gradient_clip(FrameFormat::GRAY8, 512, 256, 1);
        let error = tile(&clip, &TileSpec::new(256, 256).overlap_xy(256, 0), &Collaborators::new()).unwrap_err();
        assert!(matches!(error, TileError::InvalidOverlap { overlap: 256, size: 256, .. }));
    }

    #[test]
    fn test_tile_rejects_unaligned_overlap() {
        let clip = gradient_clip(FrameFormat::YUV420P8, 64, 64, 1);
        let error = tile(&clip, &black_tiles(32, 32).overlap(3), &Collaborators::new()).unwrap_err();
        assert_eq!(error.parameter(), Some("Overlap"));
    }

    #[test]
    fn test_untile_crop_restores_padded_grid() {
        let clip = gradient_clip(FrameFormat::YUV420P8, 100, 70, 3);
        let tiled = tile(&clip, &black_tiles(48, 32).overlap(8), &Collaborators::new()).unwrap();
        // width: 1 + ceil(52 / 40) = 3 tiles, height: 1 + ceil(38 / 24) = 3 tiles
        assert_eq!(tiled.len(), 3 * 9);
        assert_eq!((tiled.width(), tiled.height()), (48, 32));
        let full = untile(&tiled, &UntileOptions::new()).unwrap();
        assert_eq!(full.frames(), clip.frames());
    }

    #[test]
    fn test_untile_fade_of_untouched_tiles_is_lossless() {
        let clip = gradient_clip(FrameFormat::RGB24, 90, 60, 2);
        let spec = TileSpec::new(40, 30).overlap_xy(10, 6);
        let tiled = tile(&clip, &spec, &test_collaborators()).unwrap();
        let full = untile(&tiled, &UntileOptions::new().fade(true)).unwrap();
        assert_eq!(full.frames(), clip.frames());
    }

    #[test]
    fn test_untile_fade_blends_seam() {
        let left = Frame::blank(FrameFormat::GRAY8, 8, 4, &[0.0]).unwrap();
        let right = Frame::blank(FrameFormat::GRAY8, 8, 4, &[255.0]).unwrap();
        let tiles = Clip::new(vec![left, right]).unwrap();
        let options = UntileOptions::new().fade(true).manual(12, 4, (4, 0));
        let full = untile(&tiles, &options).unwrap();
        assert_eq!(full.width(), 12);
        let row: Vec<f64> = (0..12).map(|x| full.frames()[0].get(0, x, 0)).collect();
        assert_eq!(row, vec![0.0, 0.0, 0.0, 0.0, 32.0, 96.0, 159.0, 223.0, 255.0, 255.0, 255.0, 255.0]);
    }

    fn flat_pair(format: FrameFormat, width: u32, height: u32) -> Clip {
        let low = Frame::blank(format, width, height, &[0.0, 0.0, 0.0]).unwrap();
        let high = Frame::blank(format, width, height, &[255.0, 255.0, 255.0]).unwrap();
        Clip::new(vec![low, high]).unwrap()
    }

    #[test]
    fn test_untile_fade_of_subsampled_tiles_is_lossless() {
        for format in [FrameFormat::YUV420P8, FrameFormat::YUV422P8] {
            let clip = gradient_clip(format, 90, 60, 2);
            let spec = TileSpec::new(40, 30).overlap_xy(10, 6);
            let tiled = tile(&clip, &spec, &test_collaborators()).unwrap();
            let full = untile(&tiled, &UntileOptions::new().fade(true)).unwrap();
            assert_eq!(full.frames(), clip.frames(), "{}", format);
        }
    }

    #[test]
    fn test_untile_fade_samples_mask_for_chroma() {
        const LUMA: [f64; 12] = [0.0, 0.0, 0.0, 0.0, 32.0, 96.0, 159.0, 223.0, 255.0, 255.0, 255.0, 255.0];
        const HALF: [f64; 6] = [0.0, 0.0, 32.0, 159.0, 255.0, 255.0];

        for format in [FrameFormat::YUV420P8, FrameFormat::YUV422P8] {
            let options = UntileOptions::new().fade(true).manual(12, 4, (4, 0));
            let full = untile(&flat_pair(format, 8, 4), &options).unwrap();
            let frame = &full.frames()[0];
            let luma: Vec<f64> = (0..12).map(|x| frame.get(0, x, 0)).collect();
            assert_eq!(luma, LUMA, "{}", format);
            for plane in 1..3 {
                let chroma: Vec<f64> = (0..6).map(|x| frame.get(plane, x, 0)).collect();
                assert_eq!(chroma, HALF, "{} plane {}", format, plane);
            }
        }

        let options = UntileOptions::new().fade(true).manual(4, 12, (0, 4));
        let full = untile(&flat_pair(FrameFormat::YUV420P8, 4, 8), &options).unwrap();
        let column: Vec<f64> = (0..6).map(|y| full.frames()[0].get(1, 0, y)).collect();
        assert_eq!(column, HALF);

        let full = untile(&flat_pair(FrameFormat::YUV422P8, 4, 8), &options).unwrap();
        let column: Vec<f64> = (0..12).map(|y| full.frames()[0].get(2, 1, y)).collect();
        assert_eq!(column, LUMA);
    }

    #[test]
    fn test_discard_drops_partial_tiles() {
        let clip = gradient_clip(FrameFormat::GRAY8, 100, 70, 1);
        let spec = TileSpec::new(32, 32).overlap(0).padding(TilePadding::Discard);
        let tiled = tile(&clip, &spec, &Collaborators::new()).unwrap();
        assert_eq!(tiled.len(), 3 * 2);
        assert!(tiled.tags.tile.unwrap().discarded);

        let full = untile(&tiled, &UntileOptions::new()).unwrap();
        let expected = clip.frames()[0].crop_region(TileRegion::new(0, 0, 96, 64)).unwrap();
        assert_eq!(full.frames()[0], expected);
    }

    #[test]
    fn test_discard_requires_one_tile() {
        let clip = gradient_clip(FrameFormat::GRAY8, 100, 20, 1);
        let spec = TileSpec::new(32, 32).padding(TilePadding::Discard);
        assert!(tile(&clip, &spec, &Collaborators::new()).is_err());
    }

    #[test]
    fn test_tile_keeps_earlier_pad_record() {
        let clip = gradient_clip(FrameFormat::GRAY8, 30, 30, 1);
        let padded = pad(&clip, Margins::new(2, 0, 0, 0), &PadMode::Black, &Collaborators::new()).unwrap();
        let tiled = tile(&padded, &black_tiles(16, 16).overlap(4), &Collaborators::new()).unwrap();
        assert_eq!(
            tiled.tags.pad,
            Some(PadRecord {
                orig_w: 30,
                orig_h: 30,
                pad_left: 2,
                pad_right: 0,
                pad_top: 0,
                pad_bottom: 0
            })
        );
        let restored = crop(&untile(&tiled, &UntileOptions::new()).unwrap(), CropMargins::auto()).unwrap();
        assert_eq!(restored.frames(), clip.frames());
    }

    #[test]
    fn test_untile_partial_manual_parameters() {
        let clip = gradient_clip(FrameFormat::GRAY8, 16, 16, 4);
        let options = UntileOptions {
            full_width: Some(32),
            ..UntileOptions::default()
        };
        assert!(matches!(
            untile(&clip, &options),
            Err(TileError::IncompleteParameters { operation: "untile", .. })
        ));
    }

    #[test]
    fn test_untile_chunk_count_mismatch() {
        let clip = gradient_clip(FrameFormat::GRAY8, 64, 64, 1);
        let tiled = tile(&clip, &black_tiles(32, 32).overlap(0), &Collaborators::new()).unwrap();
        let trimmed = tiled.slice(0..3).unwrap();
        assert_eq!(
            untile(&trimmed, &UntileOptions::new()).unwrap_err(),
            TileError::ChunkCountMismatch { frames: 3, chunks: 4 }
        );
    }

    #[test]
    fn test_untile_missing_record() {
        let clip = gradient_clip(FrameFormat::GRAY8, 16, 16, 4);
        assert_eq!(
            untile(&clip, &UntileOptions::new()).unwrap_err(),
            TileError::MissingMetadata { record: "tile" }
        );
    }

    #[test]
    fn test_auto_untile_after_resize() {
        let clip = gradient_clip(FrameFormat::GRAY8, 100, 60, 1);
        let tiled = tile(&clip, &black_tiles(40, 40).overlap(8), &Collaborators::new()).unwrap();
        // Emulate an external 2x upscale of every tile.
        let upscaled = tiled
            .frames()
            .iter()
            .map(|_| gradient_frame(FrameFormat::GRAY8, 80, 80, 0))
            .collect();
        let upscaled = Clip::with_tags(upscaled, tiled.tags.clone()).unwrap();
        let full = untile(&upscaled, &UntileOptions::new()).unwrap();
        assert_eq!((full.width(), full.height()), (200, 120));
    }

    #[test]
    fn test_auto_untile_clamps_overlap() {
        let mut tags = Tags::default();
        tags.tile = Some(TileRecord {
            tile_w: 8,
            tile_h: 8,
            overlap_w: 7,
            overlap_h: 0,
            orig_w: 9,
            orig_h: 8,
            discarded: false,
        });
        // Tiles shrunk to 2x2: the overlap rounds to 2 and must be clamped to 1.
        let frames = vec![gradient_frame(FrameFormat::GRAY8, 2, 1, 0); 2];
        let clip = Clip::with_tags(frames, tags).unwrap();
        let full = untile(&clip, &UntileOptions::new()).unwrap();
        assert_eq!(full.width(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_grid_packing_and_roundtrip(
            width in 8u32..90,
            height in 8u32..90,
            tile_w in 8u32..40,
            tile_h in 8u32..40,
            overlap_pct in 0u32..50,
        ) {
            let overlap_w = tile_w * overlap_pct / 100;
            let overlap_h = tile_h * overlap_pct / 100;
            let clip = gradient_clip(FrameFormat::GRAY8, width, height, 2);
            let spec = black_tiles(tile_w, tile_h).overlap_xy(overlap_w, overlap_h);
            let tiled = tile(&clip, &spec, &Collaborators::new()).unwrap();

            let grid = GridLayout::covering(width, height, tile_w, tile_h, overlap_w, overlap_h).unwrap();
            prop_assert_eq!(tiled.len() / clip.len(), grid.tile_count());
            for (index, region) in grid.regions().enumerate() {
                let first = &tiled.frames()[grid.tile_count() + index];
                prop_assert_eq!(first.get(0, 0, 0), clip.frames()[1].get(0, region.x, region.y));
            }

            let full = untile(&tiled, &UntileOptions::new()).unwrap();
            prop_assert_eq!(full.frames(), clip.frames());
        }
    }
}
