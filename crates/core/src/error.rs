//! Error types for game-review-core

use serde::Serialize;
use thiserror::Error;

use crate::engine::OracleError;
use crate::parser::PgnError;

#[derive(Error, Debug)]
pub enum Error {
    /// The game record or the request parameters cannot be analyzed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The evaluation backend could not answer.
    #[error("Oracle failure: {0}")]
    Oracle(#[from] OracleError),

    /// A collaborator broke its contract.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Distinguishes "fix your input" from "the backend is unavailable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    OracleFailure,
    Internal,
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Oracle(_) => ErrorKind::OracleFailure,
            Error::Internal(_) => ErrorKind::Internal,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<PgnError> for Error {
    fn from(error: PgnError) -> Self {
        Error::InvalidInput(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::InvalidInput("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::Oracle(OracleError::Closed).kind(), ErrorKind::OracleFailure);
        assert_eq!(Error::Internal("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_pgn_error_is_invalid_input() {
        let err: Error = PgnError::NoGame.into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("No game found"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::OracleFailure).unwrap();
        assert_eq!(json, "\"oracle_failure\"");
    }
}
