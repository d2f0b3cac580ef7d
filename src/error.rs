use thiserror::Error;

/// Errors surfaced by the migration library.
///
/// Operations whose failure would silently corrupt a migration (the bulk
/// entry listing, the glossary metadata fetch, project-number extraction)
/// return [`MigrationError::Unrecoverable`]. The library never terminates
/// the process; the host decides whether to exit, retry, or report.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// An HTTP transport failure that reqwest could not recover from.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be parsed or a payload could not be built.
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An IO error while reading a local file for upload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A relationship fan-out worker panicked; no partial result exists.
    #[error("fan-out task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A built URL was not valid.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A failure with no recovery path: continuing would build the
    /// migration on incomplete foundational data.
    #[error("unrecoverable failure in {operation}: {message}")]
    Unrecoverable {
        /// The operation that failed.
        operation: &'static str,
        /// The raw error text surfaced by the API.
        message: String,
    },
}

impl MigrationError {
    /// Shorthand for the fatal-policy variant.
    pub fn unrecoverable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Unrecoverable {
            operation,
            message: message.into(),
        }
    }
}
