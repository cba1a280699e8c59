//! Geometry records attached to partitioned clips.
//!
//! A partitioning call (pad, tile, window, tpad) writes a small record that the
//! matching reconstruction call reads back in auto mode. Records live in the
//! typed [`Tags`] of a clip; when a clip has to leave the process they are
//! encoded as compact JSON blobs keyed by [`Record::KEY`].
//!
//! Attachment contract:
//! - [`PadRecord`] and [`TemporalPadRecord`] describe every frame identically
//!   and survive slicing.
//! - [`TileRecord`] and [`WindowRecord`] describe the whole sequence and are
//!   read as if from its first frame; concatenation keeps the first clip's.

use crate::core::error::{TileError, TileResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flat geometry record with a stable compact encoding.
pub trait Record: Serialize + DeserializeOwned {
    /// Blob key used when the record crosses a process boundary.
    const KEY: &'static str;

    /// Short name used in error messages.
    const NAME: &'static str;

    /// Encode as compact JSON.
    fn encode(&self) -> TileResult<String> {
        serde_json::to_string(self).map_err(|e| TileError::CorruptMetadata {
            record: Self::NAME,
            reason: e.to_string(),
        })
    }

    /// Decode a blob, ignoring unknown keys.
    fn decode(blob: &str) -> TileResult<Self> {
        serde_json::from_str(blob).map_err(|e| TileError::CorruptMetadata {
            record: Self::NAME,
            reason: e.to_string(),
        })
    }
}

/// Geometry of a spatial pad, consumed by auto crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct PadRecord {
    /// Width before padding
    pub orig_w: u32,
    /// Height before padding
    pub orig_h: u32,
    pub pad_left: u32,
    pub pad_right: u32,
    pub pad_top: u32,
    pub pad_bottom: u32,
}

impl PadRecord {
    /// Padded width at the time of padding.
    pub fn padded_width(&self) -> u32 {
        self.orig_w.saturating_add(self.pad_left).saturating_add(self.pad_right)
    }

    /// Padded height at the time of padding.
    pub fn padded_height(&self) -> u32 {
        self.orig_h.saturating_add(self.pad_top).saturating_add(self.pad_bottom)
    }
}

impl Record for PadRecord {
    const KEY: &'static str = "tileweave_padprops";
    const NAME: &'static str = "pad";
}

/// Geometry of a tile grid, consumed by auto untile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TileRecord {
    pub tile_w: u32,
    pub tile_h: u32,
    pub overlap_w: u32,
    pub overlap_h: u32,
    /// Frame width before tiling
    pub orig_w: u32,
    /// Frame height before tiling
    pub orig_h: u32,
    /// Partial tiles were dropped instead of padded
    #[serde(default)]
    pub discarded: bool,
}

impl Record for TileRecord {
    const KEY: &'static str = "tileweave_tileprops";
    const NAME: &'static str = "tile";
}

/// Geometry of temporal windows, consumed by auto unwindow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct WindowRecord {
    /// Clip length before windowing
    pub orig_length: usize,
    pub window_length: usize,
    pub overlap: usize,
    /// Tag of the padding policy for the short final window
    pub padding_tag: String,
}

impl Record for WindowRecord {
    const KEY: &'static str = "tileweave_windowprops";
    const NAME: &'static str = "window";
}

/// Frames added by a temporal pad, consumed by auto trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TemporalPadRecord {
    pub start_pad: usize,
    pub end_pad: usize,
}

impl Record for TemporalPadRecord {
    const KEY: &'static str = "tileweave_tpadprops";
    const NAME: &'static str = "temporal pad";
}

/// Typed metadata side channel of a clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Tags {
    pub pad: Option<PadRecord>,
    pub tile: Option<TileRecord>,
    pub window: Option<WindowRecord>,
    pub temporal_pad: Option<TemporalPadRecord>,
}

impl Tags {
    /// Check if no record is attached.
    pub fn is_empty(&self) -> bool {
        self.pad.is_none() && self.tile.is_none() && self.window.is_none() && self.temporal_pad.is_none()
    }

    /// Encode all attached records as blobs.
    pub fn to_blobs(&self) -> TileResult<BTreeMap<String, String>> {
        let mut blobs = BTreeMap::new();
        if let Some(record) = &self.pad {
            blobs.insert(PadRecord::KEY.to_string(), record.encode()?);
        }
        if let Some(record) = &self.tile {
            blobs.insert(TileRecord::KEY.to_string(), record.encode()?);
        }
        if let Some(record) = &self.window {
            blobs.insert(WindowRecord::KEY.to_string(), record.encode()?);
        }
        if let Some(record) = &self.temporal_pad {
            blobs.insert(TemporalPadRecord::KEY.to_string(), record.encode()?);
        }
        Ok(blobs)
    }

    /// Decode records from blobs. Keys that name no known record are ignored.
    pub fn from_blobs(blobs: &BTreeMap<String, String>) -> TileResult<Self> {
        fn read<R: Record>(blobs: &BTreeMap<String, String>) -> TileResult<Option<R>> {
            blobs.get(R::KEY).map(|blob| R::decode(blob)).transpose()
        }
        Ok(Self {
            pad: read(blobs)?,
            tile: read(blobs)?,
            window: read(blobs)?,
            temporal_pad: read(blobs)?,
        })
    }

    /// Get a record for auto mode or fail with [`TileError::MissingMetadata`].
    pub fn require<'a, R: Record>(slot: &'a Option<R>) -> TileResult<&'a R> {
        slot.as_ref()
            .ok_or(TileError::MissingMetadata { record: R::NAME })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_record_encoding_is_compact() {
        let record = PadRecord {
            orig_w: 100,
            orig_h: 100,
            pad_left: 10,
            pad_right: 0,
            pad_top: 0,
            pad_bottom: 0,
        };
        assert_eq!(
            record.encode().unwrap(),
            r#"{"orig_w":100,"orig_h":100,"pad_left":10,"pad_right":0,"pad_top":0,"pad_bottom":0}"#
        );
        assert_eq!(record.padded_width(), 110);
    }

    #[test]
    fn test_encode_failure_is_reported() {
        #[derive(Deserialize)]
        struct Unwritable;

        impl Serialize for Unwritable {
            fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("no encoding"))
            }
        }

        impl Record for Unwritable {
            const KEY: &'static str = "unwritable";
            const NAME: &'static str = "unwritable";
        }

        let error = Unwritable.encode().unwrap_err();
        assert!(matches!(error, TileError::CorruptMetadata { record: "unwritable", .. }));
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let blob = r#"{"tile_w":256,"tile_h":128,"overlap_w":16,"overlap_h":8,"orig_w":1920,"orig_h":1080,"discarded":true,"comment":"x"}"#;
        let record = TileRecord::decode(blob).unwrap();
        assert_eq!(record.tile_h, 128);
        assert!(record.discarded);
    }

    #[test]
    fn test_decode_missing_key_is_corrupt() {
        let error = WindowRecord::decode(r#"{"orig_length":10,"window_length":4}"#).unwrap_err();
        assert!(matches!(error, TileError::CorruptMetadata { record: "window", .. }));
    }

    #[test]
    fn test_decode_wrong_type_is_corrupt() {
        let error = TemporalPadRecord::decode(r#"{"start_pad":"two","end_pad":0}"#).unwrap_err();
        assert!(error.is_metadata_error());
    }

    #[test]
    fn test_tags_blob_exchange() {
        let tags = Tags {
            window: Some(WindowRecord {
                orig_length: 50,
                window_length: 20,
                overlap: 5,
                padding_tag: "mirror".to_string(),
            }),
            temporal_pad: Some(TemporalPadRecord { start_pad: 0, end_pad: 3 }),
            ..Tags::default()
        };
        let mut blobs = tags.to_blobs().unwrap();
        blobs.insert("unrelated".to_string(), "not json".to_string());
        assert_eq!(Tags::from_blobs(&blobs).unwrap(), tags);
    }

    #[test]
    fn test_require_missing_record() {
        let tags = Tags::default();
        assert!(tags.is_empty());
        assert_eq!(
            Tags::require(&tags.pad).unwrap_err(),
            TileError::MissingMetadata { record: "pad" }
        );
    }
}
