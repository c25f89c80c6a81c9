use crate::primitives::Amount;

// ─── Token Parameters ────────────────────────────────────────────────────────

/// Number of decimal places for the native STRAND token.
pub const STRAND_DECIMALS: u32 = 18;

/// One full STRAND token in base units (10^18).
pub const ONE_STRAND: Amount = 1_000_000_000_000_000_000;

/// Fixed-point scale for reward-per-token accounting.
pub const SCALE: Amount = 1_000_000_000_000_000_000;

// ─── Epoch Parameters ────────────────────────────────────────────────────────

/// Default epoch length (seconds) — one week.
pub const DEFAULT_EPOCH_LENGTH: u64 = 7 * 24 * 3600;

// ─── Staking Parameters ──────────────────────────────────────────────────────

/// Default reward-distribution period for the staking ledger (seconds).
pub const DEFAULT_REWARDS_DURATION: u64 = 7 * 24 * 3600;

// ─── Bridge Parameters ───────────────────────────────────────────────────────

/// Default window over which a consumed bridge limit fully replenishes (seconds).
pub const DEFAULT_LIMIT_DURATION: u64 = 24 * 3600;

/// Maximum encoded message size accepted by the messenger (bytes).
pub const MAX_MESSAGE_SIZE: usize = 65_536;

/// Current envelope wire version.
pub const ENVELOPE_VERSION: u8 = 1;
