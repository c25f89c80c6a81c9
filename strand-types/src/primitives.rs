use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 hash.
pub type Hash = [u8; 32];

/// 20-byte account or contract address, local to one chain.
pub type Address = [u8; 20];

/// Numeric identifier of a connected chain.
pub type ChainId = u32;

/// Gauge identifier — domain-separated hash of (chain_id, address).
pub type GaugeId = Hash;

/// Cross-chain account identity — domain-separated hash of (chain_id, address).
///
/// The same wallet address on two chains is a distinct principal unless
/// explicitly bridged.
pub type AccountId = Hash;

/// Deterministic identifier of a cross-chain message, used for dedup.
pub type MessageId = Hash;

/// Epoch index derived from the genesis timestamp.
pub type Epoch = u64;

/// Amount of tokens or voting power (native uses 18 decimals).
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The all-zero address, rejected wherever an address identifies a principal.
pub const ZERO_ADDRESS: Address = [0u8; 20];

fn domain_hash(context: &str, chain_id: ChainId, address: &Address) -> Hash {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(&chain_id.to_le_bytes());
    hasher.update(address);
    *hasher.finalize().as_bytes()
}

/// Derive the gauge id for a yield endpoint at (chain_id, address).
pub fn gauge_id(chain_id: ChainId, address: &Address) -> GaugeId {
    domain_hash("strand.gauge.v1", chain_id, address)
}

/// Derive the cross-chain account id for a wallet at (chain_id, address).
pub fn account_id(chain_id: ChainId, address: &Address) -> AccountId {
    domain_hash("strand.account.v1", chain_id, address)
}

/// Derive a message id from routing data and the encoded payload.
///
/// The sender nonce makes two otherwise identical messages distinct, so the
/// receive-side seen-set only collapses true redeliveries.
pub fn message_id(src: ChainId, dest: ChainId, nonce: u64, payload: &[u8]) -> MessageId {
    let mut hasher = blake3::Hasher::new_derive_key("strand.message.v1");
    hasher.update(&src.to_le_bytes());
    hasher.update(&dest.to_le_bytes());
    hasher.update(&nonce.to_le_bytes());
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

/// Direction of value flow through a bridge relay.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum LimitDirection {
    /// Tokens entering this chain (minted by the relay).
    Mint,
    /// Tokens leaving this chain (burned by the relay).
    Burn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_id_deterministic() {
        let addr = [7u8; 20];
        assert_eq!(gauge_id(1, &addr), gauge_id(1, &addr));
    }

    #[test]
    fn test_same_address_different_chains_distinct() {
        let addr = [7u8; 20];
        assert_ne!(account_id(1, &addr), account_id(2, &addr));
        assert_ne!(gauge_id(1, &addr), gauge_id(2, &addr));
    }

    #[test]
    fn test_gauge_and_account_domains_separated() {
        let addr = [7u8; 20];
        assert_ne!(gauge_id(1, &addr), account_id(1, &addr));
    }

    #[test]
    fn test_message_id_varies_with_nonce() {
        let payload = b"payload";
        assert_ne!(message_id(1, 2, 0, payload), message_id(1, 2, 1, payload));
    }

    #[test]
    fn test_message_id_varies_with_route() {
        let payload = b"payload";
        assert_ne!(message_id(1, 2, 0, payload), message_id(2, 1, 0, payload));
    }
}
