//! Error types for hostfuse-ingest
//!
//! Per-record errors (`MissingRequiredField`, `InvalidTimestamp`) abort only the
//! record they describe; the reconcile pipeline decides whether that fails the batch.
//! `IdentifierMismatch` is a caller bug and is always fatal to the merge call.

use hostfuse_common::SourceKind;
use std::fmt;
use thiserror::Error;

/// Fields a normalizer must derive; never defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    HostId,
    LastSeen,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::HostId => f.write_str("host_id"),
            RequiredField::LastSeen => f.write_str("last_seen"),
        }
    }
}

/// Ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Normalizer could not derive host_id or last_seen
    #[error("{vendor} record {record}: missing required field '{field}'")]
    MissingRequiredField {
        field: RequiredField,
        vendor: SourceKind,
        /// Best identifying hint available (host id, address, hostname, ...)
        record: String,
    },

    /// last_seen present but not parseable as an instant
    #[error("{vendor} record {record}: invalid last_seen timestamp {value}")]
    InvalidTimestamp {
        vendor: SourceKind,
        record: String,
        value: String,
    },

    /// Merge called on two different hosts
    #[error("Cannot merge host '{left}' with host '{right}'")]
    IdentifierMismatch { left: String, right: String },

    /// Host source returned something unusable
    #[error("{vendor} source error: {message}")]
    Source { vendor: SourceKind, message: String },

    /// Host sink could not store or return hosts
    #[error("Sink error: {0}")]
    Sink(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// hostfuse-common error
    #[error("Common error: {0}")]
    Common(#[from] hostfuse_common::Error),
}

impl IngestError {
    /// True for errors that invalidate a single raw record rather than the run
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            IngestError::MissingRequiredField { .. } | IngestError::InvalidTimestamp { .. }
        )
    }
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_field_and_record() {
        let err = IngestError::MissingRequiredField {
            field: RequiredField::LastSeen,
            vendor: SourceKind::Qualys,
            record: "10.0.0.5".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("qualys"));
        assert!(msg.contains("10.0.0.5"));
        assert!(msg.contains("last_seen"));
        assert!(err.is_record_error());
    }

    #[test]
    fn test_mismatch_is_not_record_error() {
        let err = IngestError::IdentifierMismatch {
            left: "a".to_string(),
            right: "b".to_string(),
        };
        assert!(!err.is_record_error());
    }
}
