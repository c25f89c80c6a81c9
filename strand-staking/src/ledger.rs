use std::collections::BTreeMap;

use strand_types::constants::SCALE;
use strand_types::primitives::{AccountId, Amount, Timestamp};

use crate::error::StakingError;

/// A staker's position, keyed by cross-chain account identity.
/// Created on first stake, never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakePosition {
    pub balance: Amount,
    pub reward_per_token_paid: Amount,
    pub pending_reward: Amount,
}

/// Continuous reward-per-token accrual over all staked balances.
///
/// `reward_per_token_stored` increases monotonically while anything is
/// staked. Every mutating call checkpoints the global accumulator and the
/// touched account's pending reward *before* applying the balance delta.
#[derive(Debug, Clone)]
pub struct StakingLedger {
    duration: u64,
    finish_at: Timestamp,
    reward_rate: Amount,
    reward_per_token_stored: Amount,
    last_update: Timestamp,
    total_staked: Amount,
    positions: BTreeMap<AccountId, StakePosition>,
}

impl StakingLedger {
    pub fn new(duration: u64) -> Result<Self, StakingError> {
        if duration == 0 {
            return Err(StakingError::InvalidDuration);
        }
        Ok(Self {
            duration,
            finish_at: 0,
            reward_rate: 0,
            reward_per_token_stored: 0,
            last_update: 0,
            total_staked: 0,
            positions: BTreeMap::new(),
        })
    }

    /// The accrual clock never advances past the end of the reward period.
    fn last_time_applicable(&self, now: Timestamp) -> Timestamp {
        now.min(self.finish_at)
    }

    /// The cumulative reward per staked token, scaled by `SCALE`.
    pub fn reward_per_token(&self, now: Timestamp) -> Amount {
        if self.total_staked == 0 {
            return self.reward_per_token_stored;
        }
        let elapsed = self.last_time_applicable(now).saturating_sub(self.last_update) as Amount;
        self.reward_per_token_stored
            + self.reward_rate.saturating_mul(elapsed).saturating_mul(SCALE) / self.total_staked
    }

    /// Total reward accrued and not yet claimed by an account.
    pub fn earned(&self, now: Timestamp, account: &AccountId) -> Amount {
        let Some(pos) = self.positions.get(account) else {
            return 0;
        };
        pos.balance
            .saturating_mul(self.reward_per_token(now) - pos.reward_per_token_paid)
            / SCALE
            + pos.pending_reward
    }

    /// Settle accrual up to `now` for the global accumulator and one account.
    /// Must run before any balance delta is applied.
    fn checkpoint(&mut self, now: Timestamp, account: &AccountId) {
        self.reward_per_token_stored = self.reward_per_token(now);
        self.last_update = self.last_time_applicable(now);
        let earned = self.earned(now, account);
        let pos = self.positions.entry(*account).or_default();
        pos.pending_reward = earned;
        pos.reward_per_token_paid = self.reward_per_token_stored;
    }

    pub fn stake(
        &mut self,
        now: Timestamp,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        self.checkpoint(now, &account);
        let pos = self.positions.entry(account).or_default();
        pos.balance += amount;
        self.total_staked += amount;
        Ok(())
    }

    pub fn unstake(
        &mut self,
        now: Timestamp,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let available = self.balance_of(&account);
        if amount > available {
            return Err(StakingError::InsufficientStake {
                requested: amount,
                available,
            });
        }
        self.checkpoint(now, &account);
        let pos = self.positions.entry(account).or_default();
        pos.balance -= amount;
        self.total_staked -= amount;
        Ok(())
    }

    /// Settle and zero an account's pending reward, returning the amount.
    pub fn claim(&mut self, now: Timestamp, account: AccountId) -> Result<Amount, StakingError> {
        self.checkpoint(now, &account);
        let pos = self.positions.entry(account).or_default();
        let reward = pos.pending_reward;
        pos.pending_reward = 0;
        Ok(reward)
    }

    /// Start or extend a reward period with `amount` new reward tokens.
    ///
    /// Leftover rate from a still-active period rolls into the new one.
    /// `reward_balance` is the reward-token balance actually held; a schedule
    /// that exceeds it is rejected outright — no IOU schedules.
    pub fn notify_reward(
        &mut self,
        now: Timestamp,
        amount: Amount,
        reward_balance: Amount,
    ) -> Result<(), StakingError> {
        self.reward_per_token_stored = self.reward_per_token(now);
        self.last_update = self.last_time_applicable(now);

        let duration = self.duration as Amount;
        let rate = if now >= self.finish_at {
            amount / duration
        } else {
            let remaining = (self.finish_at - now) as Amount;
            (amount + remaining * self.reward_rate) / duration
        };
        if rate == 0 {
            return Err(StakingError::RewardRateZero);
        }
        let required = rate * duration;
        if required > reward_balance {
            return Err(StakingError::RewardExceedsBalance {
                required,
                available: reward_balance,
            });
        }

        self.reward_rate = rate;
        self.finish_at = now + self.duration;
        self.last_update = now;
        Ok(())
    }

    /// Change the reward period length. Only allowed between periods.
    pub fn set_duration(&mut self, now: Timestamp, duration: u64) -> Result<(), StakingError> {
        if duration == 0 {
            return Err(StakingError::InvalidDuration);
        }
        if now < self.finish_at {
            return Err(StakingError::RewardsDurationActive {
                finish_at: self.finish_at,
            });
        }
        self.duration = duration;
        Ok(())
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.positions.get(account).map(|p| p.balance).unwrap_or(0)
    }

    pub fn position(&self, account: &AccountId) -> Option<&StakePosition> {
        self.positions.get(account)
    }

    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    pub fn reward_rate(&self) -> Amount {
        self.reward_rate
    }

    pub fn finish_at(&self) -> Timestamp {
        self.finish_at
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }
}
