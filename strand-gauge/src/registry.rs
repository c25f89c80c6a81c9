use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use strand_types::primitives::{gauge_id, Address, Amount, ChainId, GaugeId, ZERO_ADDRESS};

use crate::error::GaugeError;

/// The kind of yield endpoint a gauge represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum GaugeKind {
    /// A liquidity pool endpoint.
    Liquidity,
    /// A staking vault endpoint.
    Staking,
}

/// A reward-receiving endpoint on some chain.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Gauge {
    /// Deterministic id: hash of (chain_id, address).
    pub id: GaugeId,
    pub kind: GaugeKind,
    pub chain_id: ChainId,
    pub address: Address,
    /// Fixed floor reward per epoch, guaranteed regardless of votes.
    pub base_reward: Amount,
}

/// Gauge identity, lifecycle, and the aggregate reward-budget invariant:
/// the sum of active base rewards never exceeds `total_reward_per_epoch`.
#[derive(Debug, Clone)]
pub struct GaugeRegistry {
    gauges: BTreeMap<GaugeId, Gauge>,
    total_reward_per_epoch: Amount,
    total_base_reward: Amount,
}

impl GaugeRegistry {
    pub fn new(total_reward_per_epoch: Amount) -> Self {
        Self {
            gauges: BTreeMap::new(),
            total_reward_per_epoch,
            total_base_reward: 0,
        }
    }

    /// Register a gauge. Fails if the address is zero, the gauge already
    /// exists, or the new aggregate base reward would exceed the epoch budget.
    pub fn add_gauge(
        &mut self,
        kind: GaugeKind,
        chain_id: ChainId,
        address: Address,
        base_reward: Amount,
    ) -> Result<GaugeId, GaugeError> {
        if address == ZERO_ADDRESS {
            return Err(GaugeError::ZeroGaugeAddress);
        }
        let id = gauge_id(chain_id, &address);
        if self.gauges.contains_key(&id) {
            return Err(GaugeError::GaugeAlreadyExists(id));
        }
        let available = self.total_reward_per_epoch - self.total_base_reward;
        if base_reward > available {
            return Err(GaugeError::InsufficientBudget {
                requested: base_reward,
                available,
            });
        }

        self.total_base_reward += base_reward;
        self.gauges.insert(
            id,
            Gauge {
                id,
                kind,
                chain_id,
                address,
                base_reward,
            },
        );
        Ok(id)
    }

    /// Remove a gauge, retiring its base-reward contribution.
    /// Returns the removed record so the caller can retire its voted power.
    pub fn remove_gauge(&mut self, id: &GaugeId) -> Result<Gauge, GaugeError> {
        let gauge = self
            .gauges
            .remove(id)
            .ok_or(GaugeError::GaugeNotFound(*id))?;
        self.total_base_reward -= gauge.base_reward;
        Ok(gauge)
    }

    /// Change the per-epoch reward cap. Fails if the new cap would drop below
    /// the aggregate base reward already committed to active gauges.
    pub fn set_total_reward_per_epoch(&mut self, total: Amount) -> Result<(), GaugeError> {
        if total < self.total_base_reward {
            return Err(GaugeError::InsufficientBudget {
                requested: self.total_base_reward,
                available: total,
            });
        }
        self.total_reward_per_epoch = total;
        Ok(())
    }

    pub fn get(&self, id: &GaugeId) -> Option<&Gauge> {
        self.gauges.get(id)
    }

    pub fn contains(&self, id: &GaugeId) -> bool {
        self.gauges.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gauge> {
        self.gauges.values()
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    pub fn total_reward_per_epoch(&self) -> Amount {
        self.total_reward_per_epoch
    }

    pub fn total_base_reward(&self) -> Amount {
        self.total_base_reward
    }

    /// The pool distributed proportionally to votes.
    pub fn voteable_reward(&self) -> Amount {
        self.total_reward_per_epoch - self.total_base_reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_address(byte: u8) -> Address {
        [byte; 20]
    }

    #[test]
    fn test_add_gauge() {
        let mut registry = GaugeRegistry::new(1_000);
        let id = registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(1), 300)
            .unwrap();
        assert!(registry.contains(&id));
        assert_eq!(registry.total_base_reward(), 300);
        assert_eq!(registry.voteable_reward(), 700);
    }

    #[test]
    fn test_zero_address_rejected() {
        let mut registry = GaugeRegistry::new(1_000);
        let result = registry.add_gauge(GaugeKind::Liquidity, 1, ZERO_ADDRESS, 100);
        assert!(matches!(result, Err(GaugeError::ZeroGaugeAddress)));
    }

    #[test]
    fn test_duplicate_gauge_rejected() {
        let mut registry = GaugeRegistry::new(1_000);
        registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(1), 100)
            .unwrap();
        let result = registry.add_gauge(GaugeKind::Staking, 1, make_address(1), 100);
        assert!(matches!(result, Err(GaugeError::GaugeAlreadyExists(_))));
        assert_eq!(registry.total_base_reward(), 100);
    }

    #[test]
    fn test_budget_exceeded_rejected() {
        let mut registry = GaugeRegistry::new(1_000);
        registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(1), 600)
            .unwrap();
        let result = registry.add_gauge(GaugeKind::Liquidity, 1, make_address(2), 500);
        assert!(matches!(
            result,
            Err(GaugeError::InsufficientBudget {
                requested: 500,
                available: 400,
            })
        ));
    }

    #[test]
    fn test_remove_gauge_retires_base_reward() {
        let mut registry = GaugeRegistry::new(1_000);
        let id = registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(1), 600)
            .unwrap();
        let gauge = registry.remove_gauge(&id).unwrap();
        assert_eq!(gauge.base_reward, 600);
        assert_eq!(registry.total_base_reward(), 0);
        assert!(!registry.contains(&id));
        // Budget is free again.
        registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(2), 900)
            .unwrap();
    }

    #[test]
    fn test_remove_unknown_gauge() {
        let mut registry = GaugeRegistry::new(1_000);
        let result = registry.remove_gauge(&[9u8; 32]);
        assert!(matches!(result, Err(GaugeError::GaugeNotFound(_))));
    }

    #[test]
    fn test_set_total_reward_floor() {
        let mut registry = GaugeRegistry::new(1_000);
        registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(1), 600)
            .unwrap();
        assert!(registry.set_total_reward_per_epoch(500).is_err());
        registry.set_total_reward_per_epoch(2_000).unwrap();
        assert_eq!(registry.voteable_reward(), 1_400);
    }

    #[test]
    fn test_same_address_on_two_chains_is_two_gauges() {
        let mut registry = GaugeRegistry::new(1_000);
        let a = registry
            .add_gauge(GaugeKind::Liquidity, 1, make_address(1), 100)
            .unwrap();
        let b = registry
            .add_gauge(GaugeKind::Liquidity, 2, make_address(1), 100)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }
}
