//! Continuous reward-accrual staking for the Strand Protocol.
//!
//! The ledger tracks one authoritative reward-per-token accumulator across
//! local and mirrored remote positions. The home endpoint wires it to the
//! token vault and to the cross-chain messenger, so remote stakers get the
//! same accrual semantics as home-chain stakers.

pub mod error;
pub mod home;
pub mod ledger;
