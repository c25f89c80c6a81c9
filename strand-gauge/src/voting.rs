use std::collections::BTreeMap;

use strand_types::primitives::{AccountId, Amount, Epoch, GaugeId};

use crate::error::GaugeError;

/// Per-epoch allocation of voting power from accounts to gauges.
///
/// Power is accounted, never escrowed: an account's used power per epoch is
/// capped by its derived total power at the time of the vote, and repeated
/// votes accumulate up to that ceiling. Every table is epoch-indexed; no
/// unscoped global counters exist.
#[derive(Debug, Clone, Default)]
pub struct VotingLedger {
    used_power: BTreeMap<Epoch, BTreeMap<AccountId, Amount>>,
    gauge_power: BTreeMap<Epoch, BTreeMap<GaugeId, Amount>>,
    total_power_used: BTreeMap<Epoch, Amount>,
}

impl VotingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote of `power` from `account` to `gauge` in `epoch`.
    ///
    /// `total_power` is the account's derived ceiling at this observation
    /// point; the vote fails if it would push the account's used power past it.
    pub fn record_vote(
        &mut self,
        epoch: Epoch,
        account: AccountId,
        gauge: GaugeId,
        power: Amount,
        total_power: Amount,
    ) -> Result<(), GaugeError> {
        let used = self
            .used_power
            .get(&epoch)
            .and_then(|m| m.get(&account))
            .copied()
            .unwrap_or(0);
        let available = total_power.saturating_sub(used);
        if power > available {
            return Err(GaugeError::InsufficientPower {
                requested: power,
                available,
            });
        }

        *self
            .used_power
            .entry(epoch)
            .or_default()
            .entry(account)
            .or_insert(0) += power;
        *self
            .gauge_power
            .entry(epoch)
            .or_default()
            .entry(gauge)
            .or_insert(0) += power;
        *self.total_power_used.entry(epoch).or_insert(0) += power;
        Ok(())
    }

    /// Retire a removed gauge's power in the given epoch only.
    /// Historical epochs are untouched. Returns the retired power.
    pub fn retire_gauge(&mut self, epoch: Epoch, gauge: &GaugeId) -> Amount {
        let removed = self
            .gauge_power
            .get_mut(&epoch)
            .and_then(|m| m.remove(gauge))
            .unwrap_or(0);
        if removed > 0 {
            if let Some(total) = self.total_power_used.get_mut(&epoch) {
                *total = total.saturating_sub(removed);
            }
        }
        removed
    }

    pub fn used_power(&self, epoch: Epoch, account: &AccountId) -> Amount {
        self.used_power
            .get(&epoch)
            .and_then(|m| m.get(account))
            .copied()
            .unwrap_or(0)
    }

    pub fn gauge_power(&self, epoch: Epoch, gauge: &GaugeId) -> Amount {
        self.gauge_power
            .get(&epoch)
            .and_then(|m| m.get(gauge))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_power_used(&self, epoch: Epoch) -> Amount {
        self.total_power_used.get(&epoch).copied().unwrap_or(0)
    }
}
