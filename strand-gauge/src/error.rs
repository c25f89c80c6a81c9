use thiserror::Error;

use strand_types::error::TokenError;
use strand_types::primitives::{Amount, Epoch, GaugeId};

/// Errors specific to the gauge voting and reward layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GaugeError {
    #[error("gauge address must not be zero")]
    ZeroGaugeAddress,

    #[error("invalid amount: amount must be positive")]
    InvalidAmount,

    #[error("genesis timestamp already set")]
    GenesisAlreadySet,

    #[error("genesis timestamp not set")]
    GenesisNotSet,

    #[error("gauge not found: {}", hex::encode(.0))]
    GaugeNotFound(GaugeId),

    #[error("gauge already exists: {}", hex::encode(.0))]
    GaugeAlreadyExists(GaugeId),

    #[error("insufficient reward budget: requested {requested}, available {available}")]
    InsufficientBudget { requested: Amount, available: Amount },

    #[error("epoch mismatch: expected {expected}, got {actual}")]
    EpochMismatch { expected: Epoch, actual: Epoch },

    #[error("epoch {0} not finalized")]
    EpochNotFinalized(Epoch),

    #[error("epoch {0} already finalized")]
    EpochAlreadyFinalized(Epoch),

    #[error("epoch {0} has not ended")]
    EpochNotEnded(Epoch),

    #[error("insufficient voting power: requested {requested}, available {available}")]
    InsufficientPower { requested: Amount, available: Amount },

    #[error("reward already pulled for gauge {} in epoch {epoch}", hex::encode(.gauge_id))]
    RewardAlreadyPulled { gauge_id: GaugeId, epoch: Epoch },

    #[error("not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("emission exhausted: required {required}, available {available}")]
    SupplyExhausted { required: Amount, available: Amount },

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}
