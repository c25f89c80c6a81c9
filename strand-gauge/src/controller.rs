use std::collections::BTreeSet;

use tracing::{debug, info};

use strand_types::collab::{PermissionGate, PowerSource, RewardMinter, Role};
use strand_types::primitives::{account_id, gauge_id, Address, Amount, ChainId, Epoch, GaugeId, Timestamp};

use crate::epoch::EpochClock;
use crate::error::GaugeError;
use crate::registry::{GaugeKind, GaugeRegistry};
use crate::reward::{proportional_share, EpochSnapshot, RewardLedger};
use crate::voting::VotingLedger;

/// Who is casting a vote.
///
/// Local callers have their total power derived live; relayed cross-chain
/// votes carry a power assertion from an allow-listed relay and are trusted.
#[derive(Debug, Clone)]
pub enum VoteOrigin {
    Direct {
        chain_id: ChainId,
        account: Address,
    },
    Relayed {
        relay: Address,
        account_id: strand_types::primitives::AccountId,
        total_power: Amount,
    },
}

/// Who is pulling a gauge's epoch reward.
#[derive(Debug, Clone)]
pub enum PullOrigin {
    /// The gauge's own address, calling locally.
    Gauge { chain_id: ChainId, address: Address },
    /// An allow-listed relay pulling on a remote gauge's behalf.
    Relayed { relay: Address },
}

/// Orchestrates the epoch clock, gauge registry, voting ledger, and reward
/// ledger of the chain that owns the authoritative gauge state.
///
/// All admin operations go through the external permission gate; relay
/// trust is an explicit allow-list administered the same way.
pub struct GaugeController {
    clock: EpochClock,
    registry: GaugeRegistry,
    voting: VotingLedger,
    rewards: RewardLedger,
    relays: BTreeSet<Address>,
}

impl GaugeController {
    pub fn new(epoch_length: u64, total_reward_per_epoch: Amount) -> Self {
        Self {
            clock: EpochClock::new(epoch_length),
            registry: GaugeRegistry::new(total_reward_per_epoch),
            voting: VotingLedger::new(),
            rewards: RewardLedger::new(),
            relays: BTreeSet::new(),
        }
    }

    fn require_admin(&self, gate: &dyn PermissionGate, actor: &Address) -> Result<(), GaugeError> {
        if !gate.is_authorized(actor, Role::Admin) {
            return Err(GaugeError::NotAuthorized {
                reason: "caller is not an admin".to_string(),
            });
        }
        Ok(())
    }

    fn require_genesis(&self) -> Result<(), GaugeError> {
        if self.clock.genesis() == 0 {
            return Err(GaugeError::GenesisNotSet);
        }
        Ok(())
    }

    /// Set the epoch genesis timestamp. May be done exactly once.
    pub fn set_genesis(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        genesis: Timestamp,
    ) -> Result<(), GaugeError> {
        self.require_admin(gate, admin)?;
        self.clock.set_genesis(genesis)?;
        info!(genesis, "epoch genesis set");
        Ok(())
    }

    /// Allow-list a relay address.
    pub fn add_relay(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        relay: Address,
    ) -> Result<(), GaugeError> {
        self.require_admin(gate, admin)?;
        self.relays.insert(relay);
        Ok(())
    }

    /// Remove a relay from the allow-list.
    pub fn remove_relay(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        relay: &Address,
    ) -> Result<(), GaugeError> {
        self.require_admin(gate, admin)?;
        self.relays.remove(relay);
        Ok(())
    }

    pub fn is_relay(&self, relay: &Address) -> bool {
        self.relays.contains(relay)
    }

    /// Register a gauge.
    pub fn add_gauge(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        kind: GaugeKind,
        chain_id: ChainId,
        address: Address,
        base_reward: Amount,
    ) -> Result<GaugeId, GaugeError> {
        self.require_admin(gate, admin)?;
        let id = self.registry.add_gauge(kind, chain_id, address, base_reward)?;
        info!(
            gauge = %hex::encode(id),
            chain_id,
            base_reward,
            "gauge added"
        );
        Ok(id)
    }

    /// Remove a gauge, retiring its base reward and its current-epoch voted
    /// power. Historical epochs are untouched.
    pub fn remove_gauge(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        now: Timestamp,
        id: &GaugeId,
    ) -> Result<(), GaugeError> {
        self.require_admin(gate, admin)?;
        self.registry.remove_gauge(id)?;
        let epoch = self.clock.current_epoch(now);
        let retired = self.voting.retire_gauge(epoch, id);
        info!(
            gauge = %hex::encode(id),
            epoch,
            retired_power = retired,
            "gauge removed"
        );
        Ok(())
    }

    /// Change the per-epoch reward cap.
    pub fn set_total_reward_per_epoch(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        total: Amount,
    ) -> Result<(), GaugeError> {
        self.require_admin(gate, admin)?;
        self.registry.set_total_reward_per_epoch(total)
    }

    /// Finalize an epoch: snapshot the current aggregate totals into it and
    /// seed the next epoch with the same totals. One-way, strictly in order.
    pub fn finalize_epoch(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        now: Timestamp,
        epoch: Epoch,
    ) -> Result<(), GaugeError> {
        self.require_admin(gate, admin)?;
        self.require_genesis()?;
        let current = self.clock.current_epoch(now);
        if epoch > current {
            return Err(GaugeError::EpochMismatch {
                expected: current,
                actual: epoch,
            });
        }
        let snapshot = EpochSnapshot {
            total_reward: self.registry.total_reward_per_epoch(),
            total_base_reward: self.registry.total_base_reward(),
            voteable_reward: self.registry.voteable_reward(),
        };
        self.rewards.finalize(epoch, snapshot)?;
        info!(
            epoch,
            total_reward = snapshot.total_reward,
            voteable_reward = snapshot.voteable_reward,
            "epoch finalized"
        );
        Ok(())
    }

    /// Cast a vote of `power` on a gauge for the current epoch.
    pub fn vote(
        &mut self,
        now: Timestamp,
        origin: VoteOrigin,
        power_source: &dyn PowerSource,
        gauge: GaugeId,
        epoch: Epoch,
        power: Amount,
    ) -> Result<(), GaugeError> {
        if power == 0 {
            return Err(GaugeError::InvalidAmount);
        }
        self.require_genesis()?;
        let current = self.clock.current_epoch(now);
        if epoch != current {
            return Err(GaugeError::EpochMismatch {
                expected: current,
                actual: epoch,
            });
        }
        // The prior epoch must be finalized before votes are accepted
        // (waived for epoch 0).
        if epoch > 0 && !self.rewards.is_finalized(epoch - 1) {
            return Err(GaugeError::EpochNotFinalized(epoch - 1));
        }
        if !self.registry.contains(&gauge) {
            return Err(GaugeError::GaugeNotFound(gauge));
        }

        let (account, total_power) = match origin {
            VoteOrigin::Direct { chain_id, account } => {
                let total = power_source.total_power(chain_id, &account);
                (account_id(chain_id, &account), total)
            }
            VoteOrigin::Relayed {
                relay,
                account_id,
                total_power,
            } => {
                if !self.relays.contains(&relay) {
                    return Err(GaugeError::NotAuthorized {
                        reason: "relay is not allow-listed".to_string(),
                    });
                }
                (account_id, total_power)
            }
        };

        self.voting
            .record_vote(epoch, account, gauge, power, total_power)?;
        debug!(
            epoch,
            gauge = %hex::encode(gauge),
            power,
            "vote recorded"
        );
        Ok(())
    }

    /// The reward owed to a gauge for an epoch:
    /// base reward plus the vote-proportional share of the voteable snapshot.
    pub fn compute_reward(&self, epoch: Epoch, gauge: &GaugeId) -> Result<Amount, GaugeError> {
        let record = self
            .registry
            .get(gauge)
            .ok_or(GaugeError::GaugeNotFound(*gauge))?;
        let snapshot = self
            .rewards
            .snapshot(epoch)
            .ok_or(GaugeError::EpochNotFinalized(epoch))?;
        let share = proportional_share(
            snapshot.voteable_reward,
            self.voting.gauge_power(epoch, gauge),
            self.voting.total_power_used(epoch),
        );
        Ok(record.base_reward + share)
    }

    /// Disburse a gauge's epoch reward, exactly once per (gauge, epoch).
    ///
    /// The pulled mark is only set after the mint succeeds, so an exhausted
    /// emission surfaces as an error and the pull may be retried later.
    pub fn pull(
        &mut self,
        now: Timestamp,
        origin: PullOrigin,
        epoch: Epoch,
        gauge: GaugeId,
        recipient: Address,
        minter: &mut dyn RewardMinter,
    ) -> Result<Amount, GaugeError> {
        self.require_genesis()?;
        let record = self
            .registry
            .get(&gauge)
            .ok_or(GaugeError::GaugeNotFound(gauge))?;
        match origin {
            PullOrigin::Gauge { chain_id, address } => {
                if gauge_id(chain_id, &address) != record.id {
                    return Err(GaugeError::NotAuthorized {
                        reason: "caller is not the gauge's own address".to_string(),
                    });
                }
            }
            PullOrigin::Relayed { relay } => {
                if !self.relays.contains(&relay) {
                    return Err(GaugeError::NotAuthorized {
                        reason: "relay is not allow-listed".to_string(),
                    });
                }
            }
        }
        if !self.rewards.is_finalized(epoch) {
            return Err(GaugeError::EpochNotFinalized(epoch));
        }
        if epoch >= self.clock.current_epoch(now) {
            return Err(GaugeError::EpochNotEnded(epoch));
        }
        if self.rewards.is_pulled(epoch, &gauge) {
            return Err(GaugeError::RewardAlreadyPulled {
                gauge_id: gauge,
                epoch,
            });
        }

        let reward = self.compute_reward(epoch, &gauge)?;
        let mintable = minter.mintable();
        if reward > mintable {
            return Err(GaugeError::SupplyExhausted {
                required: reward,
                available: mintable,
            });
        }
        minter.mint(&recipient, reward)?;
        self.rewards.mark_pulled(epoch, gauge)?;
        info!(
            epoch,
            gauge = %hex::encode(gauge),
            reward,
            "epoch reward pulled"
        );
        Ok(reward)
    }

    pub fn clock(&self) -> &EpochClock {
        &self.clock
    }

    pub fn registry(&self) -> &GaugeRegistry {
        &self.registry
    }

    pub fn voting(&self) -> &VotingLedger {
        &self.voting
    }

    pub fn rewards(&self) -> &RewardLedger {
        &self.rewards
    }
}
