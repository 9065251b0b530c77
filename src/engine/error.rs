//! Engine error and warning types.

use thiserror::Error;

/// Errors reported by a search handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The search failed.
    #[error("Search failed: {0}")]
    Failed(String),

    /// The search was abandoned before producing a result.
    #[error("Search was cancelled")]
    Cancelled,
}

impl SearchError {
    /// Create a failure with a message.
    pub fn failed(msg: impl Into<String>) -> Self {
        SearchError::Failed(msg.into())
    }
}

/// Non-fatal problems the engine recovers from on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineWarning {
    /// Creation was enabled without an inserter, so it is disabled.
    #[error("creatable is enabled but no insert callback is configured; creation is disabled")]
    CreatableWithoutInserter,

    /// The inserter returned no usable option list for a fragment.
    #[error("insert callback returned no new option for '{fragment}'; skipping it")]
    MalformedInsertResult {
        /// The text that was being created.
        fragment: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_display() {
        assert_eq!(SearchError::failed("timeout").to_string(), "Search failed: timeout");
        assert_eq!(SearchError::Cancelled.to_string(), "Search was cancelled");
    }

    #[test]
    fn test_warning_display() {
        let warning = EngineWarning::MalformedInsertResult {
            fragment: "kiwi".to_string(),
        };
        assert!(warning.to_string().contains("'kiwi'"));
        assert!(EngineWarning::CreatableWithoutInserter
            .to_string()
            .contains("creation is disabled"));
    }
}
