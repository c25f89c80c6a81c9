use strand_types::error::StrandError;
use strand_types::message::BridgeMessage;
use strand_types::primitives::Amount;

/// Relay cost quoting for cross-chain messages.
///
/// fee = base_fee + per_byte * encoded_len
///
/// The quote is what the caller must supply to the transport; it is advisory
/// and carries no custody of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub base_fee: Amount,
    pub per_byte: Amount,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: 1_000,
            per_byte: 10,
        }
    }
}

impl FeeSchedule {
    pub fn new(base_fee: Amount, per_byte: Amount) -> Self {
        Self { base_fee, per_byte }
    }

    /// Quote the relay cost for a message.
    pub fn quote(&self, msg: &BridgeMessage) -> Result<Amount, StrandError> {
        let encoded = borsh::to_vec(msg).map_err(|e| StrandError::Serialization {
            reason: e.to_string(),
        })?;
        Ok(self
            .base_fee
            .saturating_add(self.per_byte.saturating_mul(encoded.len() as Amount)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_types::message::{ClaimPayload, PullPayload, RelayOptions};

    #[test]
    fn test_quote_scales_with_size() {
        let fees = FeeSchedule::new(1_000, 10);
        let small = fees
            .quote(&BridgeMessage::Pull(PullPayload {
                epoch: 0,
                gauge_id: [0u8; 32],
                gauge_address: [0u8; 20],
            }))
            .unwrap();
        let larger = fees
            .quote(&BridgeMessage::Claim(ClaimPayload {
                chain_id: 1,
                account: [0u8; 20],
                options: RelayOptions::default(),
            }))
            .unwrap();
        assert!(small > 1_000);
        assert_ne!(small, larger);
    }

    #[test]
    fn test_quote_includes_base_fee() {
        let fees = FeeSchedule::new(5_000, 0);
        let quote = fees
            .quote(&BridgeMessage::Pull(PullPayload {
                epoch: 0,
                gauge_id: [0u8; 32],
                gauge_address: [0u8; 20],
            }))
            .unwrap();
        assert_eq!(quote, 5_000);
    }
}
