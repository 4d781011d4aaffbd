//! Error handling for Tilekit
//!
//! Consistency violations are fatal and abort the operation that detected them.
//! Decode errors are reported per entry so loaders can skip what they cannot read.

use std::path::PathBuf;

use thiserror::Error;

use crate::assets::AssetType;

/// Result type alias for Tilekit operations
pub type Result<T> = std::result::Result<T, AssetError>;

/// Main error type for Tilekit operations
#[derive(Error, Debug)]
pub enum AssetError {
    // Consistency Errors
    #[error("Store consistency violation: {reason}")]
    ConsistencyViolation { reason: String },

    #[error("Duplicate {asset_type} id: {id}")]
    DuplicateId { asset_type: AssetType, id: String },

    #[error("Duplicate {asset_type} internal id: {internal_id}")]
    DuplicateInternalId {
        asset_type: AssetType,
        internal_id: u32,
    },

    #[error("Diff sequences differ in length: {before} before, {after} after")]
    DiffLengthMismatch { before: usize, after: usize },

    // Decode Errors
    #[error("Truncated data: expected {expected} bytes, found {actual}")]
    TruncatedData { expected: usize, actual: usize },

    #[error("Invalid hex data: {reason}")]
    InvalidHex { reason: String },

    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Malformed bundle entry '{id}': {reason}")]
    MalformedEntry { id: String, reason: String },

    #[error("Animation frames differ in size: expected {expected_width}x{expected_height}, found {width}x{height}")]
    InconsistentFrameSize {
        expected_width: u16,
        expected_height: u16,
        width: u16,
        height: u16,
    },

    #[error("Dimension too large for encoding: {field} = {value}")]
    DimensionOverflow { field: &'static str, value: usize },

    // Serialization Errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // I/O Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AssetError::ConsistencyViolation { .. } => "CONSISTENCY_VIOLATION",
            AssetError::DuplicateId { .. } => "DUPLICATE_ID",
            AssetError::DuplicateInternalId { .. } => "DUPLICATE_INTERNAL_ID",
            AssetError::DiffLengthMismatch { .. } => "DIFF_LENGTH_MISMATCH",
            AssetError::TruncatedData { .. } => "TRUNCATED_DATA",
            AssetError::InvalidHex { .. } => "INVALID_HEX",
            AssetError::Base64(_) => "INVALID_BASE64",
            AssetError::MalformedEntry { .. } => "MALFORMED_ENTRY",
            AssetError::InconsistentFrameSize { .. } => "INCONSISTENT_FRAME_SIZE",
            AssetError::DimensionOverflow { .. } => "DIMENSION_OVERFLOW",
            AssetError::Json(_) => "JSON_ERROR",
            AssetError::FileReadError { .. } => "FILE_READ_ERROR",
            AssetError::Io(_) => "IO_ERROR",
        }
    }

    /// Returns true if this error means the store itself is corrupt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AssetError::ConsistencyViolation { .. }
                | AssetError::DuplicateId { .. }
                | AssetError::DuplicateInternalId { .. }
                | AssetError::DiffLengthMismatch { .. }
        )
    }

    /// Returns true if the error came from decoding a single bundle entry.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            AssetError::TruncatedData { .. }
                | AssetError::InvalidHex { .. }
                | AssetError::Base64(_)
                | AssetError::MalformedEntry { .. }
                | AssetError::InconsistentFrameSize { .. }
                | AssetError::DimensionOverflow { .. }
                | AssetError::Json(_)
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            AssetError::ConsistencyViolation { .. }
            | AssetError::DuplicateId { .. }
            | AssetError::DuplicateInternalId { .. } => {
                Some("The asset store is inconsistent. Reload the project from its resource bundle.")
            }
            AssetError::TruncatedData { .. } | AssetError::InvalidHex { .. } => {
                Some("The bundle entry is corrupt. Re-export it from the editor.")
            }
            AssetError::MalformedEntry { .. } => Some("Check the entry's mimeType and data fields."),
            AssetError::InconsistentFrameSize { .. } => {
                Some("Resize all animation frames to the same dimensions.")
            }
            AssetError::FileReadError { .. } => Some("Check the file path and try again."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AssetError::DuplicateId {
            asset_type: AssetType::Tile,
            id: "myTiles.tile1".to_string(),
        };
        assert_eq!(err.error_code(), "DUPLICATE_ID");
        assert_eq!(err.to_string(), "Duplicate tile id: myTiles.tile1");
    }

    #[test]
    fn test_fatal_classification() {
        let fatal = AssetError::DuplicateInternalId {
            asset_type: AssetType::Image,
            internal_id: 4,
        };
        assert!(fatal.is_fatal());
        assert!(!fatal.is_decode_error());
        assert!(fatal.recovery_suggestion().is_some());

        let decode = AssetError::TruncatedData {
            expected: 9,
            actual: 5,
        };
        assert!(!decode.is_fatal());
        assert!(decode.is_decode_error());
    }
}
