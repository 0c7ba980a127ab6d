use thiserror::Error;

#[derive(Error, Debug)]
pub enum HavocError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed service binding document: {0}")]
    Vcap(#[from] serde_json::Error),

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Invalid chaos settings: {0}")]
    InvalidSettings(String),
}
