use thiserror::Error;

/// Errors shared across the Strand protocol crates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrandError {
    #[error("invalid amount: amount must be positive")]
    InvalidAmount,

    #[error("zero address not permitted")]
    ZeroAddress,

    #[error("message too large: {size} > {max_size}")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

/// Errors surfaced by the external token collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("supply cap exceeded: minting {requested} with {mintable} available")]
    SupplyCapExceeded { requested: u128, mintable: u128 },
}
