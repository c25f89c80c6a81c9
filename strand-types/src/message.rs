use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{ENVELOPE_VERSION, MAX_MESSAGE_SIZE};
use crate::error::StrandError;
use crate::primitives::*;

/// Transport options carried alongside relayed user operations.
///
/// Covers the execution budget the relay must supply on the destination chain
/// for the continuation (the finalize hop of an ABA round trip).
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RelayOptions {
    /// Gas budget for the destination-side continuation.
    pub gas_limit: u64,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self { gas_limit: 200_000 }
    }
}

/// A relayed vote: allocate voting power from an account to a gauge.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct VotePayload {
    /// Power to allocate in this vote.
    pub power: Amount,
    /// Total derived power asserted by the sending chain's relay.
    pub total_power: Amount,
    /// Epoch the vote targets.
    pub epoch: Epoch,
    /// Gauge receiving the power.
    pub gauge_id: GaugeId,
    /// Cross-chain identity of the voter.
    pub account_id: AccountId,
}

/// A relayed reward pull for a finalized epoch.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PullPayload {
    /// Epoch whose reward is being pulled.
    pub epoch: Epoch,
    /// Gauge pulling its reward.
    pub gauge_id: GaugeId,
    /// Address the reward is minted to.
    pub gauge_address: Address,
}

/// A relayed stake request targeting the ledger-owning chain.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct StakePayload {
    pub amount: Amount,
    /// Chain the staking account lives on.
    pub chain_id: ChainId,
    pub account: Address,
    pub options: RelayOptions,
}

/// A relayed unstake request targeting the ledger-owning chain.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct UnstakePayload {
    pub amount: Amount,
    pub chain_id: ChainId,
    pub account: Address,
    pub options: RelayOptions,
}

/// A relayed claim of accrued staking rewards.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ClaimPayload {
    pub chain_id: ChainId,
    pub account: Address,
    pub options: RelayOptions,
}

/// The operation a finalize message completes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum FinalizeOp {
    Stake,
    Unstake,
    Claim,
}

/// The return hop of an ABA round trip.
///
/// Sent by the ledger-owning chain after applying the authoritative mutation;
/// releases relay-held custody on the initiating chain.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct FinalizePayload {
    /// Which operation this completes.
    pub op: FinalizeOp,
    /// Id of the request envelope being completed.
    pub request_id: MessageId,
    /// Settled amount (stake released, unstake returned, or reward claimed).
    pub amount: Amount,
    /// Chain the account lives on (the finalize destination).
    pub chain_id: ChainId,
    pub account: Address,
}

/// Top-level typed message exchanged between chain-local instances.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum BridgeMessage {
    /// A cross-chain gauge vote.
    Vote(VotePayload),
    /// A cross-chain reward pull.
    Pull(PullPayload),
    /// A stake request (A → B hop).
    Stake(StakePayload),
    /// An unstake request (A → B hop).
    Unstake(UnstakePayload),
    /// A reward claim request (A → B hop).
    Claim(ClaimPayload),
    /// A completion message (B → A hop).
    Finalize(FinalizePayload),
}

impl BridgeMessage {
    /// Returns a stable discriminant byte for this message variant.
    /// Used by `MessageEnvelope` for forward-compatible type tagging.
    pub fn discriminant(&self) -> u8 {
        match self {
            BridgeMessage::Vote(_) => 0,
            BridgeMessage::Pull(_) => 1,
            BridgeMessage::Stake(_) => 2,
            BridgeMessage::Unstake(_) => 3,
            BridgeMessage::Claim(_) => 4,
            BridgeMessage::Finalize(_) => 5,
        }
    }

    /// Whether a `message_type` byte names one of the staking requests
    /// (Stake, Unstake, Claim) handled by the ledger-owning endpoint.
    pub fn is_staking_request(message_type: u8) -> bool {
        matches!(message_type, 2..=4)
    }
}

/// Versioned envelope for cross-chain messages.
///
/// Wraps borsh-encoded payloads so that instances can skip unknown
/// `message_type` values instead of failing, and carries the deterministic
/// message id the receive side uses for redelivery dedup.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MessageEnvelope {
    /// Envelope version (currently 1).
    pub version: u8,
    /// Known message type discriminator. Corresponds to the `BridgeMessage`
    /// enum variant index.
    pub message_type: u8,
    /// Deterministic message id: blake3(src || dest || nonce || payload).
    pub id: MessageId,
    /// Originating chain.
    pub src_chain: ChainId,
    /// Destination chain.
    pub dest_chain: ChainId,
    /// Borsh-encoded inner message payload.
    pub payload: Vec<u8>,
}

impl MessageEnvelope {
    /// Wrap a `BridgeMessage` into a versioned envelope.
    pub fn wrap(
        msg: &BridgeMessage,
        src_chain: ChainId,
        dest_chain: ChainId,
        nonce: u64,
    ) -> Result<Self, StrandError> {
        let payload = borsh::to_vec(msg).map_err(|e| StrandError::Serialization {
            reason: e.to_string(),
        })?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(StrandError::MessageTooLarge {
                size: payload.len(),
                max_size: MAX_MESSAGE_SIZE,
            });
        }
        let id = message_id(src_chain, dest_chain, nonce, &payload);
        Ok(Self {
            version: ENVELOPE_VERSION,
            message_type: msg.discriminant(),
            id,
            src_chain,
            dest_chain,
            payload,
        })
    }

    /// Unwrap the envelope back into a `BridgeMessage`.
    ///
    /// Returns `None` if the payload is malformed or the `message_type` is
    /// unknown (forward-compatible skip).
    pub fn unwrap_message(&self) -> Option<BridgeMessage> {
        BridgeMessage::try_from_slice(&self.payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> BridgeMessage {
        BridgeMessage::Vote(VotePayload {
            power: 10,
            total_power: 100,
            epoch: 3,
            gauge_id: [1u8; 32],
            account_id: [2u8; 32],
        })
    }

    #[test]
    fn test_envelope_roundtrip() {
        let msg = sample_message();
        let envelope = MessageEnvelope::wrap(&msg, 1, 2, 7).expect("wrap failed");
        assert_eq!(envelope.version, ENVELOPE_VERSION);
        assert_eq!(envelope.message_type, 0); // Vote = discriminant 0
        assert_eq!(envelope.src_chain, 1);
        assert_eq!(envelope.dest_chain, 2);
        let unwrapped = envelope.unwrap_message().expect("unwrap failed");
        assert_eq!(msg, unwrapped);
    }

    #[test]
    fn test_envelope_id_stable_per_nonce() {
        let msg = sample_message();
        let a = MessageEnvelope::wrap(&msg, 1, 2, 7).unwrap();
        let b = MessageEnvelope::wrap(&msg, 1, 2, 7).unwrap();
        let c = MessageEnvelope::wrap(&msg, 1, 2, 8).unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_envelope_malformed_payload_returns_none() {
        let envelope = MessageEnvelope {
            version: ENVELOPE_VERSION,
            message_type: 255, // unknown
            id: [0u8; 32],
            src_chain: 1,
            dest_chain: 2,
            payload: vec![0xFF, 0xFF, 0xFF],
        };
        assert!(envelope.unwrap_message().is_none());
    }

    #[test]
    fn test_discriminant_values() {
        let msg = BridgeMessage::Finalize(FinalizePayload {
            op: FinalizeOp::Claim,
            request_id: [0u8; 32],
            amount: 1,
            chain_id: 1,
            account: [1u8; 20],
        });
        assert_eq!(msg.discriminant(), 5);
    }
}
