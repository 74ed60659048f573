use thiserror::Error;

/// Failures a board mutation can end in.
///
/// Validation errors are raised client-side before the gateway is contacted;
/// the other two come back from the gateway.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for BoardError {
    fn from(err: reqwest::Error) -> Self {
        BoardError::Transport(err.to_string())
    }
}

pub type BoardResult<T> = Result<T, BoardError>;
