//! SDK error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("operation {id} failed with code {code}: {message}")]
    OperationFailed {
        id: String,
        code: i32,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SdkError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
