use thiserror::Error;

use strand_types::error::{StrandError, TokenError};
use strand_types::primitives::{Amount, Timestamp};

/// Errors specific to the staking layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error("invalid amount: amount must be positive")]
    InvalidAmount,

    #[error("rewards duration must be positive")]
    InvalidDuration,

    #[error("insufficient stake: requested {requested}, available {available}")]
    InsufficientStake { requested: Amount, available: Amount },

    #[error("reward rate must be positive")]
    RewardRateZero,

    #[error("reward schedule exceeds held balance: required {required}, available {available}")]
    RewardExceedsBalance { required: Amount, available: Amount },

    #[error("rewards duration still active until {finish_at}")]
    RewardsDurationActive { finish_at: Timestamp },

    #[error("not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("{0}")]
    Strand(#[from] StrandError),
}
