use std::collections::BTreeMap;

use strand_types::primitives::{Address, Amount, LimitDirection, Timestamp};

use crate::error::BridgeError;

/// A decaying-bucket allowance for one relay and one flow direction.
///
/// The stored `current_limit` replenishes lazily toward `max_limit` at
/// `rate_per_second` since `timestamp`; no background timers. Consumption
/// decrements by exactly the amount used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    max_limit: Amount,
    current_limit: Amount,
    timestamp: Timestamp,
    rate_per_second: Amount,
    duration: u64,
}

impl RateLimit {
    /// Create a full bucket that replenishes over `duration` seconds.
    pub fn new(max_limit: Amount, duration: u64, now: Timestamp) -> Result<Self, BridgeError> {
        if duration == 0 {
            return Err(BridgeError::InvalidDuration);
        }
        Ok(Self {
            max_limit,
            current_limit: max_limit,
            timestamp: now,
            rate_per_second: max_limit / duration as Amount,
            duration,
        })
    }

    /// The replenished allowance at `now`, capped at `max_limit`.
    pub fn current_limit_at(&self, now: Timestamp) -> Amount {
        if self.current_limit == self.max_limit {
            return self.current_limit;
        }
        if now >= self.timestamp + self.duration {
            return self.max_limit;
        }
        let elapsed = now.saturating_sub(self.timestamp) as Amount;
        self.max_limit
            .min(self.current_limit + elapsed * self.rate_per_second)
    }

    /// Consume `amount` of the allowance at `now`.
    pub fn consume(&mut self, now: Timestamp, amount: Amount) -> Result<(), BridgeError> {
        let available = self.current_limit_at(now);
        if available < amount {
            return Err(BridgeError::RateLimitExceeded {
                requested: amount,
                available,
            });
        }
        self.current_limit = available - amount;
        self.timestamp = now;
        Ok(())
    }

    /// Change the cap, shifting the current headroom by the delta between the
    /// old and new max (clipped at zero) so the consumed/available ratio
    /// survives the change.
    pub fn change_limit(&mut self, new_max: Amount) {
        if new_max >= self.max_limit {
            self.current_limit += new_max - self.max_limit;
        } else {
            self.current_limit = self
                .current_limit
                .saturating_sub(self.max_limit - new_max)
                .min(new_max);
        }
        self.max_limit = new_max;
        self.rate_per_second = new_max / self.duration as Amount;
    }

    /// Re-derive the replenish rate for a new duration. Does not
    /// retroactively alter the stored `current_limit`.
    pub fn set_duration(&mut self, duration: u64) -> Result<(), BridgeError> {
        if duration == 0 {
            return Err(BridgeError::InvalidDuration);
        }
        self.duration = duration;
        self.rate_per_second = self.max_limit / duration as Amount;
        Ok(())
    }

    pub fn max_limit(&self) -> Amount {
        self.max_limit
    }

    pub fn rate_per_second(&self) -> Amount {
        self.rate_per_second
    }
}

/// Per-relay, per-direction bridge limits bounding cross-chain value flow.
#[derive(Debug, Clone, Default)]
pub struct BridgeLimiter {
    limits: BTreeMap<(Address, LimitDirection), RateLimit>,
}

impl BridgeLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the limit for a relay and direction. Re-configuring an
    /// existing limit applies both the new cap and the new window.
    pub fn set_limit(
        &mut self,
        now: Timestamp,
        relay: Address,
        direction: LimitDirection,
        max_limit: Amount,
        duration: u64,
    ) -> Result<(), BridgeError> {
        if duration == 0 {
            return Err(BridgeError::InvalidDuration);
        }
        match self.limits.get_mut(&(relay, direction)) {
            Some(limit) => {
                limit.change_limit(max_limit);
                limit.set_duration(duration)?;
            }
            None => {
                self.limits
                    .insert((relay, direction), RateLimit::new(max_limit, duration, now)?);
            }
        }
        Ok(())
    }

    /// Consume allowance for a mint or burn through the given relay.
    pub fn consume(
        &mut self,
        now: Timestamp,
        relay: &Address,
        direction: LimitDirection,
        amount: Amount,
    ) -> Result<(), BridgeError> {
        let limit = self
            .limits
            .get_mut(&(*relay, direction))
            .ok_or_else(|| BridgeError::NoLimitConfigured {
                relay: hex::encode(relay),
            })?;
        limit.consume(now, amount)
    }

    /// The replenished allowance at `now`, if a limit is configured.
    pub fn current_limit(
        &self,
        now: Timestamp,
        relay: &Address,
        direction: LimitDirection,
    ) -> Option<Amount> {
        self.limits
            .get(&(*relay, direction))
            .map(|l| l.current_limit_at(now))
    }

    /// Re-derive replenish rates for the named relays in both directions.
    pub fn set_duration(&mut self, duration: u64, relays: &[Address]) -> Result<(), BridgeError> {
        if duration == 0 {
            return Err(BridgeError::InvalidDuration);
        }
        for relay in relays {
            for direction in [LimitDirection::Mint, LimitDirection::Burn] {
                if let Some(limit) = self.limits.get_mut(&(*relay, direction)) {
                    limit.set_duration(duration)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RELAY: Address = [1u8; 20];

    #[test]
    fn test_starts_full() {
        let limit = RateLimit::new(100, 100, 0).unwrap();
        assert_eq!(limit.current_limit_at(0), 100);
        assert_eq!(limit.rate_per_second(), 1);
    }

    #[test]
    fn test_replenish_scenario() {
        // maxLimit=100, duration=100s, fully consumed at t0.
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        limit.consume(0, 100).unwrap();
        assert_eq!(limit.current_limit_at(0), 0);
        assert_eq!(limit.current_limit_at(50), 50);
        assert_eq!(limit.current_limit_at(100), 100);
        assert_eq!(limit.current_limit_at(10_000), 100);
    }

    #[test]
    fn test_consume_exceeding_fails() {
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        limit.consume(0, 80).unwrap();
        let result = limit.consume(0, 30);
        assert!(matches!(
            result,
            Err(BridgeError::RateLimitExceeded {
                requested: 30,
                available: 20,
            })
        ));
        // Failed consume leaves the bucket untouched.
        assert_eq!(limit.current_limit_at(0), 20);
    }

    #[test]
    fn test_partial_replenish_then_consume() {
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        limit.consume(0, 100).unwrap();
        // At t=30, 30 tokens replenished; consuming 10 leaves 20.
        limit.consume(30, 10).unwrap();
        assert_eq!(limit.current_limit_at(30), 20);
    }

    #[test]
    fn test_change_limit_raises_headroom() {
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        limit.consume(0, 60).unwrap(); // 40 left
        limit.change_limit(200);
        assert_eq!(limit.max_limit(), 200);
        // Headroom shifted by the +100 delta: 140 available.
        assert_eq!(limit.current_limit_at(0), 140);
        assert_eq!(limit.rate_per_second(), 2);
    }

    #[test]
    fn test_change_limit_lowers_headroom_clipped() {
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        limit.consume(0, 60).unwrap(); // 40 left
        limit.change_limit(30);
        // 40 - 70 clips at zero.
        assert_eq!(limit.current_limit_at(0), 0);
        assert_eq!(limit.max_limit(), 30);
    }

    #[test]
    fn test_set_duration_changes_rate_not_balance() {
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        limit.consume(0, 100).unwrap();
        limit.set_duration(50).unwrap();
        assert_eq!(limit.rate_per_second(), 2);
        // Balance was not retroactively altered; it refills at the new rate.
        assert_eq!(limit.current_limit_at(10), 20);
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert!(matches!(
            RateLimit::new(100, 0, 0),
            Err(BridgeError::InvalidDuration)
        ));
        let mut limit = RateLimit::new(100, 100, 0).unwrap();
        assert!(matches!(
            limit.set_duration(0),
            Err(BridgeError::InvalidDuration)
        ));
    }

    #[test]
    fn test_limiter_directions_independent() {
        let mut limiter = BridgeLimiter::new();
        limiter
            .set_limit(0, RELAY, LimitDirection::Mint, 100, 100)
            .unwrap();
        limiter
            .set_limit(0, RELAY, LimitDirection::Burn, 50, 100)
            .unwrap();

        limiter
            .consume(0, &RELAY, LimitDirection::Mint, 100)
            .unwrap();
        // Burn side is untouched.
        assert_eq!(
            limiter.current_limit(0, &RELAY, LimitDirection::Burn),
            Some(50)
        );
    }

    #[test]
    fn test_limiter_reconfigure_applies_new_duration() {
        let mut limiter = BridgeLimiter::new();
        limiter
            .set_limit(0, RELAY, LimitDirection::Mint, 100, 100)
            .unwrap();
        limiter
            .consume(0, &RELAY, LimitDirection::Mint, 100)
            .unwrap();
        // Re-configuring applies both the new cap and the new window: the
        // +100 delta lifts headroom to 100 and the rate becomes 200/50 = 4/s.
        limiter
            .set_limit(0, RELAY, LimitDirection::Mint, 200, 50)
            .unwrap();
        assert_eq!(
            limiter.current_limit(5, &RELAY, LimitDirection::Mint),
            Some(120)
        );
        // Zero duration is rejected on the update path too.
        assert!(matches!(
            limiter.set_limit(0, RELAY, LimitDirection::Mint, 200, 0),
            Err(BridgeError::InvalidDuration)
        ));
    }

    #[test]
    fn test_limiter_unconfigured_relay() {
        let mut limiter = BridgeLimiter::new();
        let result = limiter.consume(0, &RELAY, LimitDirection::Mint, 1);
        assert!(matches!(result, Err(BridgeError::NoLimitConfigured { .. })));
    }

    #[test]
    fn test_limiter_set_duration_for_relays() {
        let mut limiter = BridgeLimiter::new();
        limiter
            .set_limit(0, RELAY, LimitDirection::Mint, 100, 100)
            .unwrap();
        limiter.consume(0, &RELAY, LimitDirection::Mint, 100).unwrap();
        limiter.set_duration(25, &[RELAY]).unwrap();
        // New rate 4/s.
        assert_eq!(
            limiter.current_limit(5, &RELAY, LimitDirection::Mint),
            Some(20)
        );
    }

    proptest! {
        /// The available allowance never exceeds the cap and never underflows,
        /// whatever the interleaving of consumes and waits.
        #[test]
        fn prop_limit_bounded(
            max in 1u128..1_000_000,
            ops in prop::collection::vec((0u64..500, 0u128..2_000_000), 1..50),
        ) {
            let mut limit = RateLimit::new(max, 100, 0).unwrap();
            let mut now = 0u64;
            for (wait, amount) in ops {
                now += wait;
                let available = limit.current_limit_at(now);
                prop_assert!(available <= max);
                match limit.consume(now, amount) {
                    Ok(()) => prop_assert!(amount <= available),
                    Err(_) => prop_assert!(amount > available),
                }
                prop_assert!(limit.current_limit_at(now) <= max);
            }
        }

        /// After a full duration with no use, the bucket is full again.
        #[test]
        fn prop_full_after_duration(
            max in 1u128..1_000_000,
            spend in 0u128..1_000_000,
        ) {
            let mut limit = RateLimit::new(max, 100, 0).unwrap();
            let _ = limit.consume(0, spend.min(max));
            prop_assert_eq!(limit.current_limit_at(100), max);
        }
    }
}
