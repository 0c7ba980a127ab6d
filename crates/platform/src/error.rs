//! Platform error types.

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("platform not configured: {0}")]
    NotConfigured(String),
}
