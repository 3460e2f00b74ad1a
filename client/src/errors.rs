use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never completed (connection refused, timeout, interrupted
    /// body read).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-success status code. Carries the
    /// message extracted from the response `detail` field, or a generic
    /// message when the body has no usable error field.
    #[error("{1} (Status {0})")]
    Status(reqwest::StatusCode, String),
    /// The response body did not match the documented shape.
    #[error("Invariant: {0}")]
    Invariant(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
