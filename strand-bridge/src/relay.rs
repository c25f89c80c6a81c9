use std::collections::BTreeMap;

use tracing::{info, warn};

use strand_types::collab::{PermissionGate, PowerSource, Role, TokenPort};
use strand_types::message::{
    BridgeMessage, ClaimPayload, FinalizeOp, FinalizePayload, MessageEnvelope, PullPayload,
    RelayOptions, StakePayload, UnstakePayload, VotePayload,
};
use strand_types::primitives::{
    account_id, Address, Amount, ChainId, Epoch, GaugeId, LimitDirection, MessageId, Timestamp,
};

use crate::error::BridgeError;
use crate::fee::FeeSchedule;
use crate::messenger::Messenger;
use crate::rate_limit::BridgeLimiter;

/// A cross-chain action awaiting its paired completion message.
///
/// For stakes, the relay custodies the debited principal (the shadow balance)
/// until the finalize hop releases it; a dropped completion therefore leaves
/// recoverable funds rather than a stranded user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub op: FinalizeOp,
    pub account: Address,
    pub amount: Amount,
}

/// The chain-local bridge relay: initiates ABA round trips toward the
/// ledger-owning chain, custodies in-flight principal, and settles finalize
/// messages through the rate limiter.
pub struct TokenRelay {
    chain_id: ChainId,
    /// Chain holding the authoritative gauge and staking ledgers.
    home_chain: ChainId,
    /// The relay's own custody address on this chain.
    address: Address,
    limiter: BridgeLimiter,
    fees: FeeSchedule,
    pending: BTreeMap<MessageId, PendingTransfer>,
}

impl TokenRelay {
    pub fn new(chain_id: ChainId, home_chain: ChainId, address: Address) -> Self {
        Self {
            chain_id,
            home_chain,
            address,
            limiter: BridgeLimiter::new(),
            fees: FeeSchedule::default(),
            pending: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn home_chain(&self) -> ChainId {
        self.home_chain
    }

    fn require_admin(&self, gate: &dyn PermissionGate, actor: &Address) -> Result<(), BridgeError> {
        if !gate.is_authorized(actor, Role::Admin) {
            return Err(BridgeError::NotAuthorized {
                reason: "caller is not an admin".to_string(),
            });
        }
        Ok(())
    }

    /// Configure the mint or burn allowance for this relay.
    pub fn set_limit(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        now: Timestamp,
        direction: LimitDirection,
        max_limit: Amount,
        duration: u64,
    ) -> Result<(), BridgeError> {
        self.require_admin(gate, admin)?;
        self.limiter
            .set_limit(now, self.address, direction, max_limit, duration)
    }

    /// Re-derive the replenish rate for a new limit duration.
    pub fn set_limit_duration(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        duration: u64,
    ) -> Result<(), BridgeError> {
        self.require_admin(gate, admin)?;
        let relays = [self.address];
        self.limiter.set_duration(duration, &relays)
    }

    /// Replace the fee schedule.
    pub fn set_fees(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        fees: FeeSchedule,
    ) -> Result<(), BridgeError> {
        self.require_admin(gate, admin)?;
        self.fees = fees;
        Ok(())
    }

    /// The relay cost the caller must supply for a message.
    pub fn quote(&self, msg: &BridgeMessage) -> Result<Amount, BridgeError> {
        Ok(self.fees.quote(msg)?)
    }

    pub fn current_limit(&self, now: Timestamp, direction: LimitDirection) -> Option<Amount> {
        self.limiter.current_limit(now, &self.address, direction)
    }

    pub fn pending(&self, id: &MessageId) -> Option<&PendingTransfer> {
        self.pending.get(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Initiate a cross-chain stake: custody the principal, then request the
    /// authoritative mutation from the home chain (the A → B hop).
    pub fn stake(
        &mut self,
        messenger: &mut Messenger,
        token: &mut dyn TokenPort,
        account: Address,
        amount: Amount,
        options: RelayOptions,
    ) -> Result<MessageEnvelope, BridgeError> {
        if amount == 0 {
            return Err(BridgeError::InvalidAmount);
        }
        token.transfer(&account, &self.address, amount)?;
        let env = messenger.envelope(
            self.home_chain,
            &BridgeMessage::Stake(StakePayload {
                amount,
                chain_id: self.chain_id,
                account,
                options,
            }),
        )?;
        self.pending.insert(
            env.id,
            PendingTransfer {
                op: FinalizeOp::Stake,
                account,
                amount,
            },
        );
        info!(
            request = %hex::encode(env.id),
            amount,
            "stake custodied, request sent"
        );
        Ok(env)
    }

    /// Initiate a cross-chain unstake. The principal returns with finalize.
    pub fn unstake(
        &mut self,
        messenger: &mut Messenger,
        account: Address,
        amount: Amount,
        options: RelayOptions,
    ) -> Result<MessageEnvelope, BridgeError> {
        if amount == 0 {
            return Err(BridgeError::InvalidAmount);
        }
        let env = messenger.envelope(
            self.home_chain,
            &BridgeMessage::Unstake(UnstakePayload {
                amount,
                chain_id: self.chain_id,
                account,
                options,
            }),
        )?;
        self.pending.insert(
            env.id,
            PendingTransfer {
                op: FinalizeOp::Unstake,
                account,
                amount,
            },
        );
        Ok(env)
    }

    /// Initiate a cross-chain reward claim.
    pub fn claim(
        &mut self,
        messenger: &mut Messenger,
        account: Address,
        options: RelayOptions,
    ) -> Result<MessageEnvelope, BridgeError> {
        let env = messenger.envelope(
            self.home_chain,
            &BridgeMessage::Claim(ClaimPayload {
                chain_id: self.chain_id,
                account,
                options,
            }),
        )?;
        self.pending.insert(
            env.id,
            PendingTransfer {
                op: FinalizeOp::Claim,
                account,
                // Settled amount is decided by the home-chain ledger.
                amount: 0,
            },
        );
        Ok(env)
    }

    /// Relay a local account's vote to the gauge chain, asserting its derived
    /// total power. Single hop; no custody involved.
    pub fn send_vote(
        &mut self,
        messenger: &mut Messenger,
        power_source: &dyn PowerSource,
        account: Address,
        gauge_id: GaugeId,
        epoch: Epoch,
        power: Amount,
    ) -> Result<MessageEnvelope, BridgeError> {
        if power == 0 {
            return Err(BridgeError::InvalidAmount);
        }
        let total_power = power_source.total_power(self.chain_id, &account);
        let env = messenger.envelope(
            self.home_chain,
            &BridgeMessage::Vote(VotePayload {
                power,
                total_power,
                epoch,
                gauge_id,
                account_id: account_id(self.chain_id, &account),
            }),
        )?;
        Ok(env)
    }

    /// Relay a local gauge's reward pull to the gauge chain. Single hop.
    pub fn send_pull(
        &mut self,
        messenger: &mut Messenger,
        epoch: Epoch,
        gauge_id: GaugeId,
        gauge_address: Address,
    ) -> Result<MessageEnvelope, BridgeError> {
        let env = messenger.envelope(
            self.home_chain,
            &BridgeMessage::Pull(PullPayload {
                epoch,
                gauge_id,
                gauge_address,
            }),
        )?;
        Ok(env)
    }

    /// Apply the finalize hop (B → A): release custody for the completed
    /// request. Tolerates redelivery through the messenger's dedup upstream;
    /// a finalize with no matching pending record is rejected.
    pub fn on_finalize(
        &mut self,
        now: Timestamp,
        payload: &FinalizePayload,
        token: &mut dyn TokenPort,
    ) -> Result<(), BridgeError> {
        let pending = self
            .pending
            .get(&payload.request_id)
            .cloned()
            .ok_or(BridgeError::NoPendingTransfer(payload.request_id))?;

        // Validate fully before mutating; the pending record is only removed
        // once the settlement has gone through.
        let custody = self.address;
        match payload.op {
            FinalizeOp::Stake => {
                // Principal now lives on the home chain's ledger; the shadow
                // balance leaves this chain through the burn limit.
                self.limiter
                    .consume(now, &custody, LimitDirection::Burn, pending.amount)?;
                token.burn(&custody, pending.amount)?;
            }
            FinalizeOp::Unstake | FinalizeOp::Claim => {
                // Value enters this chain through the mint limit.
                self.limiter
                    .consume(now, &custody, LimitDirection::Mint, payload.amount)?;
                token.mint(&payload.account, payload.amount)?;
            }
        }
        self.pending.remove(&payload.request_id);
        info!(
            request = %hex::encode(payload.request_id),
            op = ?payload.op,
            amount = payload.amount,
            "finalize applied, custody released"
        );
        Ok(())
    }

    /// Admin recovery for a finalize message that was lost in transit.
    /// Applies the same release path as a delivered finalize.
    pub fn manual_finalize(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        now: Timestamp,
        payload: &FinalizePayload,
        token: &mut dyn TokenPort,
    ) -> Result<(), BridgeError> {
        self.require_admin(gate, admin)?;
        warn!(
            request = %hex::encode(payload.request_id),
            "manual finalize triggered"
        );
        self.on_finalize(now, payload, token)
    }

    /// Admin recovery for a stake the home chain rejected: return the
    /// custodied principal to the user.
    pub fn refund(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        request_id: &MessageId,
        token: &mut dyn TokenPort,
    ) -> Result<(), BridgeError> {
        self.require_admin(gate, admin)?;
        let pending = self
            .pending
            .get(request_id)
            .cloned()
            .ok_or(BridgeError::NoPendingTransfer(*request_id))?;
        if pending.op != FinalizeOp::Stake {
            return Err(BridgeError::NotAuthorized {
                reason: "only custodied stakes can be refunded".to_string(),
            });
        }
        let custody = self.address;
        token.transfer(&custody, &pending.account, pending.amount)?;
        self.pending.remove(request_id);
        warn!(
            request = %hex::encode(request_id),
            amount = pending.amount,
            "custodied stake refunded"
        );
        Ok(())
    }
}
