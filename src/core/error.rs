//! Error types for Tileweave.
//!
//! Uses thiserror for structured errors with context. Every error is raised
//! synchronously by the call that detected it and carries:
//! - The parameter or record involved
//! - The constraint that was violated
//! - The actual offending value

use thiserror::Error;

/// Errors raised by partitioning and reconstruction operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TileError {
    /// An argument is out of range or inconsistent with the clip.
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput {
        /// Offending parameter
        parameter: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// An offset or extent would split a subsampled chroma sample.
    #[error("{parameter} ({value}) must be a multiple of {alignment} for format {format} due to chroma subsampling")]
    UnalignedValue {
        /// Offending parameter
        parameter: &'static str,
        /// Value given
        value: u64,
        /// Required multiple
        alignment: u32,
        /// Name of the clip format
        format: String,
    },

    /// A value that must not be negative was.
    #[error("{parameter} can not be negative (got {value})")]
    NegativeValue {
        /// Offending parameter
        parameter: &'static str,
        /// Value given
        value: f64,
    },

    /// An overlap is not smaller than the chunk it belongs to.
    #[error("{parameter} ({overlap}) must be smaller than the chunk size ({size})")]
    InvalidOverlap {
        /// Offending parameter
        parameter: &'static str,
        /// Overlap given
        overlap: u64,
        /// Chunk size along the same axis
        size: u64,
    },

    /// More tiles per frame or windows per clip than [`crate::core::MAX_CHUNKS`].
    #[error("This would create {count} chunks (max {max}). Reduce overlap or increase chunk size")]
    TooManyChunks {
        /// Chunks the call would create
        count: usize,
        /// Allowed maximum
        max: usize,
    },

    /// Auto mode found no record on the clip.
    #[error("Clip has no {record} metadata. Provide the parameters manually or pass the clip returned by the partitioning call")]
    MissingMetadata {
        /// Name of the missing record
        record: &'static str,
    },

    /// A record could not be decoded or describes impossible geometry.
    #[error("Corrupt {record} metadata: {reason}")]
    CorruptMetadata {
        /// Name of the record
        record: &'static str,
        /// Decoder or validation message
        reason: String,
    },

    /// Only part of the manual geometry was given.
    #[error("In manual mode {expected} are used together. Provide all or none of them")]
    IncompleteParameters {
        /// Operation that was called
        operation: &'static str,
        /// Parameters that belong together
        expected: &'static str,
    },

    /// The clip length is not a multiple of the tiles per frame.
    #[error("Clip length ({frames} frames) is not divisible by the chunks per frame ({chunks}). Was the clip trimmed after tiling?")]
    ChunkCountMismatch {
        /// Frames in the clip
        frames: usize,
        /// Tiles per reassembled frame
        chunks: usize,
    },

    /// Crop margins leave nothing of the frame.
    #[error("Crop ({left}, {right}, {top}, {bottom}) can not be larger than frame dimensions {width}x{height}")]
    CropExceedsFrame {
        /// Left margin
        left: u32,
        /// Right margin
        right: u32,
        /// Top margin
        top: u32,
        /// Bottom margin
        bottom: u32,
        /// Frame width
        width: u32,
        /// Frame height
        height: u32,
    },

    /// A trim would remove every frame.
    #[error("Trim of {start} + {end} frames can not remove the whole clip of {length} frames")]
    TrimExceedsLength {
        /// Frames removed at the start
        start: usize,
        /// Frames removed at the end
        end: usize,
        /// Clip length
        length: usize,
    },

    /// A mode needs a collaborator that is not configured.
    #[error("Mode '{mode}' needs a {collaborator} collaborator, but none is configured")]
    MissingCollaborator {
        /// Kind of collaborator
        collaborator: &'static str,
        /// Mode that asked for it
        mode: String,
    },

    /// A collaborator failed or returned an unusable frame.
    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        /// Kind of collaborator
        collaborator: &'static str,
        /// What went wrong
        reason: String,
    },
}

impl TileError {
    /// Shorthand for an [`TileError::InvalidInput`] error.
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        TileError::InvalidInput {
            parameter,
            reason: reason.into(),
        }
    }

    /// Check if this error concerns attached metadata rather than arguments.
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            TileError::MissingMetadata { .. } | TileError::CorruptMetadata { .. }
        )
    }

    /// Get the name of the offending parameter, if the error names one.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            TileError::InvalidInput { parameter, .. }
            | TileError::UnalignedValue { parameter, .. }
            | TileError::NegativeValue { parameter, .. }
            | TileError::InvalidOverlap { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

/// Result type alias for Tileweave operations.
pub type TileResult<T> = Result<T, TileError>;
