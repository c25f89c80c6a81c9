//! In-memory collaborator implementations backing a chain instance.
//!
//! Production deployments wire the collaborator traits to on-chain contracts;
//! a node instance carries these in-memory stand-ins so the protocol state
//! machines can run end to end.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use strand_types::collab::{PermissionGate, RewardMinter, Role, TokenPort};
use strand_types::error::TokenError;
use strand_types::primitives::{Address, Amount};

#[derive(Debug, Default)]
struct LedgerInner {
    balances: BTreeMap<Address, Amount>,
    minted: Amount,
    supply_cap: Amount,
}

/// Shared-handle in-memory token ledger.
///
/// Clones share state, so the same ledger can serve as the `TokenPort` of the
/// relay and the `RewardMinter` of the gauge controller at once. Bridge mints
/// and burns move value across chains and are not counted against the supply
/// cap; only reward emission is.
#[derive(Debug, Clone, Default)]
pub struct DevLedger {
    inner: Rc<RefCell<LedgerInner>>,
}

impl DevLedger {
    pub fn new(supply_cap: Amount) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LedgerInner {
                balances: BTreeMap::new(),
                minted: 0,
                supply_cap,
            })),
        }
    }

    pub fn fund(&self, owner: Address, amount: Amount) {
        *self.inner.borrow_mut().balances.entry(owner).or_default() += amount;
    }

    pub fn minted(&self) -> Amount {
        self.inner.borrow().minted
    }
}

impl TokenPort for DevLedger {
    fn balance_of(&self, owner: &Address) -> Amount {
        self.inner.borrow().balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut inner = self.inner.borrow_mut();
        let available = inner.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        *inner.balances.entry(*from).or_default() -= amount;
        *inner.balances.entry(*to).or_default() += amount;
        Ok(())
    }

    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        *self.inner.borrow_mut().balances.entry(*to).or_default() += amount;
        Ok(())
    }

    fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut inner = self.inner.borrow_mut();
        let available = inner.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        *inner.balances.entry(*from).or_default() -= amount;
        Ok(())
    }
}

impl RewardMinter for DevLedger {
    fn mintable(&self) -> Amount {
        let inner = self.inner.borrow();
        inner.supply_cap.saturating_sub(inner.minted)
    }

    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut inner = self.inner.borrow_mut();
        let mintable = inner.supply_cap.saturating_sub(inner.minted);
        if amount > mintable {
            return Err(TokenError::SupplyCapExceeded {
                requested: amount,
                mintable,
            });
        }
        inner.minted += amount;
        *inner.balances.entry(*to).or_default() += amount;
        Ok(())
    }
}

/// Address-list permission gate.
#[derive(Debug, Clone, Default)]
pub struct DevGate {
    admins: BTreeSet<Address>,
    relays: BTreeSet<Address>,
}

impl DevGate {
    pub fn with_admin(admin: Address) -> Self {
        let mut gate = Self::default();
        gate.admins.insert(admin);
        gate
    }

    pub fn add_relay(&mut self, relay: Address) {
        self.relays.insert(relay);
    }
}

impl PermissionGate for DevGate {
    fn is_authorized(&self, actor: &Address, role: Role) -> bool {
        match role {
            Role::Admin => self.admins.contains(actor),
            Role::Relay => self.relays.contains(actor),
        }
    }
}
