use thiserror::Error;

/// Errors raised while talking to the content backend
#[derive(Debug, Error)]
pub enum CmsError {
    /// Transport failure (`reqwest`)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the API
    #[error("cms responded with {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("failed to decode cms response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Cursor not issued by this source
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// The API root advertised no master ref
    #[error("no master ref advertised by {0}")]
    MissingRef(String),

    /// Fixture file could not be read
    #[error("fixture error: {0}")]
    Fixture(String),
}

/// Result of content backend operations
pub type CmsResult<T> = Result<T, CmsError>;

impl CmsError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        } else {
            body
        };
        Self::Status {
            status: status.as_u16(),
            message,
        }
    }
}
