use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use strand_types::primitives::{Amount, Epoch, GaugeId};

use crate::error::GaugeError;

/// Immutable totals captured when an epoch is finalized.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct EpochSnapshot {
    pub total_reward: Amount,
    pub total_base_reward: Amount,
    pub voteable_reward: Amount,
}

/// Epoch finalization flags, snapshots, and per-(gauge, epoch) pull records.
///
/// Finalization is one-way and strictly in order. A finalize of epoch `e`
/// also seeds `e + 1` with the same totals; the seed is provisional and is
/// overwritten when `e + 1` itself finalizes.
#[derive(Debug, Clone, Default)]
pub struct RewardLedger {
    snapshots: BTreeMap<Epoch, EpochSnapshot>,
    finalized: BTreeSet<Epoch>,
    pulled: BTreeMap<Epoch, BTreeSet<GaugeId>>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize an epoch with the given snapshot and seed the next epoch.
    pub fn finalize(&mut self, epoch: Epoch, snapshot: EpochSnapshot) -> Result<(), GaugeError> {
        if self.finalized.contains(&epoch) {
            return Err(GaugeError::EpochAlreadyFinalized(epoch));
        }
        if epoch > 0 && !self.finalized.contains(&(epoch - 1)) {
            return Err(GaugeError::EpochNotFinalized(epoch - 1));
        }
        self.snapshots.insert(epoch, snapshot);
        self.snapshots.insert(epoch + 1, snapshot);
        self.finalized.insert(epoch);
        Ok(())
    }

    pub fn is_finalized(&self, epoch: Epoch) -> bool {
        self.finalized.contains(&epoch)
    }

    pub fn snapshot(&self, epoch: Epoch) -> Option<&EpochSnapshot> {
        self.snapshots.get(&epoch)
    }

    pub fn is_pulled(&self, epoch: Epoch, gauge: &GaugeId) -> bool {
        self.pulled
            .get(&epoch)
            .map(|s| s.contains(gauge))
            .unwrap_or(false)
    }

    /// Record that a gauge's epoch reward has been disbursed.
    /// Created lazily on the first successful pull; a second mark fails.
    pub fn mark_pulled(&mut self, epoch: Epoch, gauge: GaugeId) -> Result<(), GaugeError> {
        let entry = self.pulled.entry(epoch).or_default();
        if !entry.insert(gauge) {
            return Err(GaugeError::RewardAlreadyPulled {
                gauge_id: gauge,
                epoch,
            });
        }
        Ok(())
    }
}

/// The vote-proportional share of the voteable pool:
/// `voteable * gauge_power / total_power_used`, zero when nothing was voted.
pub fn proportional_share(
    voteable: Amount,
    gauge_power: Amount,
    total_power_used: Amount,
) -> Amount {
    if total_power_used == 0 {
        return 0;
    }
    match voteable.checked_mul(gauge_power) {
        Some(product) => product / total_power_used,
        // Split the multiplication to stay inside u128; loses at most one
        // quantum of the fractional part.
        None => {
            let whole = (voteable / total_power_used).saturating_mul(gauge_power);
            let frac = (voteable % total_power_used)
                .saturating_mul(gauge_power)
                .checked_div(total_power_used)
                .unwrap_or(0);
            whole.saturating_add(frac)
        }
    }
}
