use reqwest::StatusCode;
use snapshot::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("Rate limited by source (resets at {reset:?})")]
    RateLimited { reset: Option<u64> },

    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl FetchError {
    /// Transport failures and server errors are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => status.is_server_error(),
            FetchError::RateLimited { .. } | FetchError::Malformed(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to list repositories: {0}")]
    Listing(#[source] FetchError),

    #[error("Failed to persist snapshot: {0}")]
    Persist(#[from] StoreError),
}
