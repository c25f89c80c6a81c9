//! Rate-limited cross-chain messaging and token custody for the Strand
//! Protocol.
//!
//! Implements the decaying-bucket bridge rate limiter, the typed at-least-once
//! messenger with message-id deduplication, relay fee quoting, and the
//! shadow-custody token relay that drives two-hop (ABA) round trips against
//! the ledger-owning chain.

pub mod error;
pub mod fee;
pub mod messenger;
pub mod rate_limit;
pub mod relay;
