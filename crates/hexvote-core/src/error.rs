//! Errors surfaced to callers of the engine and gateway.
//!
//! Every variant is recoverable: a failed call leaves engine state untouched,
//! so the caller may resubmit.

use thiserror::Error;

use crate::engine::UserId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Token is not 32 characters drawn from `0-9a-f`.
    #[error("invalid token: expected 32 hex characters (0-9a-f), got {0:?}")]
    InvalidTokenFormat(String),

    /// Feedback arrived with no classification awaiting confirmation.
    #[error("no pending token for user {0}: submit a token before sending feedback")]
    NoPendingToken(UserId),

    /// Caller is not on the allow-list.
    #[error("user {0} is not authorized")]
    Unauthorized(UserId),

    /// Caller attempted an admin-only operation.
    #[error("user {0} is not an admin")]
    NotAdmin(UserId),

    /// Command was missing or had a malformed argument.
    #[error("usage: {0}")]
    Usage(String),
}
