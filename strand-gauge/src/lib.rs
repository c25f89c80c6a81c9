//! Epoch-partitioned gauge voting and reward distribution for the Strand
//! Protocol.
//!
//! Implements the epoch clock, gauge registry with its aggregate budget
//! invariant, per-epoch voting-power accounting, and exactly-once reward
//! disbursement through an inflation-bounded external minter.

pub mod controller;
pub mod epoch;
pub mod error;
pub mod registry;
pub mod reward;
pub mod voting;
