//! Error types for FastBai
//!
//! Defines all error types used throughout the library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for BAI index operations
///
/// Any error returned while opening or loading leaves the index unusable;
/// callers should drop the instance rather than retry.
#[derive(Debug, Error)]
pub enum BaiError {
    /// Index file does not exist
    #[error("BAI file not found: {0} (check the path or index the BAM file)")]
    FileNotFound(PathBuf),

    /// Malformed index content: bad magic, bad unmapped bin, truncated record
    #[error("Invalid BAI format: {0}")]
    Format(String),

    /// Catalog offsets disagree with what the cursor observed on re-parse
    #[error("Reference {ref_id} not properly aligned: expected offset {expected}, found {found}")]
    Integrity {
        ref_id: usize,
        expected: u64,
        found: u64,
    },

    /// Malformed caller input (region bounds, seek offset, reference id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BaiError {
    /// Convert an I/O error raised while decoding `what`, turning a short read
    /// into a format error.
    pub(crate) fn decoding(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            BaiError::Format(format!("truncated {}", what))
        } else {
            BaiError::Io(err)
        }
    }
}

/// Result type alias for BAI operations
pub type BaiResult<T> = std::result::Result<T, BaiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_maps_eof_to_format() {
        let err = BaiError::decoding(io::Error::from(io::ErrorKind::UnexpectedEof), "bin header");
        match err {
            BaiError::Format(msg) => assert_eq!(msg, "truncated bin header"),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_decoding_keeps_other_io_errors() {
        let err = BaiError::decoding(io::Error::from(io::ErrorKind::PermissionDenied), "magic");
        assert!(matches!(err, BaiError::Io(_)));
    }

    #[test]
    fn test_integrity_message() {
        let err = BaiError::Integrity { ref_id: 2, expected: 100, found: 96 };
        assert_eq!(
            err.to_string(),
            "Reference 2 not properly aligned: expected offset 100, found 96"
        );
    }
}
