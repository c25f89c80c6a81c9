use strand_types::primitives::{Epoch, Timestamp};

use crate::error::GaugeError;

/// Derives the current epoch index from a genesis timestamp and a fixed
/// epoch length.
///
/// Epochs are half-open windows: epoch `e` spans
/// `[genesis + e * length, genesis + (e + 1) * length)`.
#[derive(Debug, Clone)]
pub struct EpochClock {
    genesis: Timestamp,
    epoch_length: u64,
}

impl EpochClock {
    /// Create a clock with no genesis set yet.
    pub fn new(epoch_length: u64) -> Self {
        Self {
            genesis: 0,
            epoch_length,
        }
    }

    /// Set the genesis timestamp. May be done exactly once.
    pub fn set_genesis(&mut self, genesis: Timestamp) -> Result<(), GaugeError> {
        if self.genesis != 0 {
            return Err(GaugeError::GenesisAlreadySet);
        }
        self.genesis = genesis;
        Ok(())
    }

    /// The epoch index at the given time. Times before genesis map to epoch 0.
    pub fn current_epoch(&self, now: Timestamp) -> Epoch {
        now.saturating_sub(self.genesis) / self.epoch_length
    }

    /// First second of the given epoch.
    pub fn epoch_start(&self, epoch: Epoch) -> Timestamp {
        self.genesis + epoch * self.epoch_length
    }

    /// First second after the given epoch.
    pub fn epoch_end(&self, epoch: Epoch) -> Timestamp {
        self.genesis + (epoch + 1) * self.epoch_length
    }

    /// Whether the given epoch has fully elapsed at `now`.
    pub fn has_ended(&self, epoch: Epoch, now: Timestamp) -> bool {
        now >= self.epoch_end(epoch)
    }

    pub fn genesis(&self) -> Timestamp {
        self.genesis
    }

    pub fn epoch_length(&self) -> u64 {
        self.epoch_length
    }
}
