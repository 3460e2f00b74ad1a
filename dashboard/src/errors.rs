use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{0}")]
    Api(#[from] learnhub_client::ApiError),
    /// Rejected before any request was issued.
    #[error("{0}")]
    Validation(String),
    #[error("Invariant: {0}")]
    Invariant(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
