use thiserror::Error;

use strand_types::error::{StrandError, TokenError};
use strand_types::primitives::{Amount, MessageId};

/// Errors specific to the bridge layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("invalid amount: amount must be positive")]
    InvalidAmount,

    #[error("rate limit exceeded: requested {requested}, available {available}")]
    RateLimitExceeded { requested: Amount, available: Amount },

    #[error("no bridge limit configured for relay {relay}")]
    NoLimitConfigured { relay: String },

    #[error("limit duration must be positive")]
    InvalidDuration,

    #[error("no pending transfer for request {}", hex::encode(.0))]
    NoPendingTransfer(MessageId),

    #[error("not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("{0}")]
    Strand(#[from] StrandError),
}
