use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Election errors. Every variant leaves the election unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BallotError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("already voted: {0}")]
    AlreadyVoted(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("journal error: {0}")]
    Journal(String),
}

/// Coarse error classification for transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    InvalidPhase,
    InvalidArgument,
    AlreadyExists,
    AlreadyVoted,
    NotFound,
    Journal,
}

impl BallotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::InvalidPhase(_) => ErrorKind::InvalidPhase,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::AlreadyVoted(_) => ErrorKind::AlreadyVoted,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Journal(_) => ErrorKind::Journal,
        }
    }

    /// The bare message, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(m)
            | Self::InvalidPhase(m)
            | Self::InvalidArgument(m)
            | Self::AlreadyExists(m)
            | Self::AlreadyVoted(m)
            | Self::NotFound(m)
            | Self::Journal(m) => m,
        }
    }

    pub(crate) fn not_owner() -> Self {
        Self::Unauthorized("Ownable: caller is not the owner".to_string())
    }

    pub(crate) fn not_voter() -> Self {
        Self::Unauthorized("You're not a voter".to_string())
    }

    pub(crate) fn proposal_not_found() -> Self {
        Self::NotFound("Proposal not found".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_kind_to_message() {
        let err = BallotError::AlreadyVoted("You have already voted".into());
        assert_eq!(err.to_string(), "already voted: You have already voted");
        assert_eq!(err.message(), "You have already voted");
        assert_eq!(err.kind(), ErrorKind::AlreadyVoted);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let value = serde_json::to_value(ErrorKind::InvalidPhase).unwrap();
        assert_eq!(value, serde_json::json!("invalid_phase"));
    }
}
