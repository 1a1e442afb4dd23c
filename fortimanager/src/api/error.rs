use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Object does not exist: {url}")]
    NotFound { url: String },

    #[error("Object already exists: {url}")]
    AlreadyExists { url: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("FortiManager unavailable")]
    ServiceUnavailable,

    #[error("JSON-RPC error {code} on {url}: {message}")]
    Rpc {
        code: i32,
        message: String,
        url: String,
    },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    /// "Object does not exist" on a read clears Terraform state instead of
    /// failing the refresh, so callers need to distinguish it.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}
