//! Narrow interfaces to external collaborators.
//!
//! The core protocol consumes token mechanics, permission administration, and
//! the inflation schedule through these seams and never reimplements them.

use crate::error::TokenError;
use crate::primitives::{Address, Amount, ChainId};

/// Roles recognized by the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May configure gauges, limits, epochs, and trigger manual recovery.
    Admin,
    /// Allow-listed chain-local relay trusted to mirror remote actions.
    Relay,
}

/// Permission-check gate administered outside the core protocol.
pub trait PermissionGate {
    fn is_authorized(&self, actor: &Address, role: Role) -> bool;
}

/// Basic fungible-token mechanics, chain-local.
pub trait TokenPort {
    fn balance_of(&self, owner: &Address) -> Amount;
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount)
        -> Result<(), TokenError>;
    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError>;
    fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError>;
}

/// Inflation-bounded reward emission.
///
/// `mintable` reports the remaining emission headroom; `mint` fails rather
/// than truncating when the headroom is exhausted.
pub trait RewardMinter {
    fn mintable(&self) -> Amount;
    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError>;
}

/// Derived total voting power for a chain-local account.
///
/// Implementations combine the governance-token balance with the staked
/// balance at the moment of the lookup.
pub trait PowerSource {
    fn total_power(&self, chain_id: ChainId, account: &Address) -> Amount;
}
