//! Engine error taxonomy
//!
//! Nothing here ever reaches the presentation layer: every callback boundary
//! in [`crate::sim::Session`] catches these, logs them and carries on.

use thiserror::Error;

/// Errors raised inside a scheduler or tap callback
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tapped or pruned object no longer exists. Benign.
    #[error("object {id} is no longer in play")]
    LookupMiss { id: u32 },
    /// Engine state contradicts the catalog or another invariant
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// Persistent storage failed (best time or settings)
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Anything else that went wrong inside a callback
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl EngineError {
    /// Short label used for telemetry
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::LookupMiss { .. } => "lookup_miss",
            EngineError::InvariantViolation(_) => "invariant_violation",
            EngineError::Storage(_) => "storage",
            EngineError::Unexpected(_) => "unexpected",
        }
    }

    /// Benign errors are expected during normal play and never reported
    pub fn is_benign(&self) -> bool {
        matches!(self, EngineError::LookupMiss { .. })
    }
}

/// Key-value storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored value for `{key}` is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss_is_benign() {
        let err = EngineError::LookupMiss { id: 7 };
        assert!(err.is_benign());
        assert_eq!(err.kind(), "lookup_miss");
        assert_eq!(err.to_string(), "object 7 is no longer in play");
    }

    #[test]
    fn test_storage_converts() {
        let err: EngineError = StorageError::Unavailable("quota".into()).into();
        assert!(!err.is_benign());
        assert_eq!(err.kind(), "storage");
        assert!(err.to_string().contains("quota"));
    }
}
