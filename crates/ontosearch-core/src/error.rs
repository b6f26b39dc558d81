use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a candidate source produced no answer.
///
/// Never surfaced to search callers: the hybrid engine logs it and treats
/// the branch as an empty candidate set.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceFailure {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("query embedding failed: {0}")]
    Embedding(String),
}
