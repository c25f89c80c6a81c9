//! Chain-instance wiring for the Strand Protocol: configuration, in-memory
//! collaborators, and the per-chain runtime that dispatches envelopes to the
//! gauge, bridge, and staking components.

pub mod cli;
pub mod config;
pub mod dev;
pub mod error;
pub mod runtime;
