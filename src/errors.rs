use thiserror::Error;

/// Unified error type for the sync engine (§7). Every fallible operation in this
/// crate returns `Result<T, SyncError>`; callers match on variants rather than on
/// string content.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("provider request failed transiently: {0}")]
    ProviderTransient(String),

    #[error("provider authentication failed: {0}")]
    ProviderAuth(String),

    #[error("provider rate limit exceeded, retry after {retry_after_secs:?}s")]
    ProviderRateLimited { retry_after_secs: Option<u64> },

    #[error("provider reported not found: {0}")]
    ProviderNotFound(String),

    #[error("selector ambiguous: {query} matched {candidates:?}")]
    SelectorAmbiguous {
        query: String,
        candidates: Vec<String>,
    },

    #[error("selector unresolved: {0}")]
    SelectorUnresolved(String),

    #[error("write blocked: replica is read-only or static mode active (attempted {operation})")]
    ReadOnlyBlocked { operation: String },

    #[error("mutation response failed validation: {0}")]
    MutationValidation(String),

    #[error("merge invariant violated: {0}")]
    MergeInvariantViolation(String),

    #[error("write attempted against a static snapshot provider")]
    StaticModeWrite,

    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether this error reflects a condition a retry loop should back off and
    /// retry rather than surface immediately (§7).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ProviderTransient(_) | SyncError::ProviderRateLimited { .. }
        )
    }
}
