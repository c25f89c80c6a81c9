use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use strand_bridge::messenger::Messenger;
use strand_types::collab::{PermissionGate, Role, TokenPort};
use strand_types::message::{BridgeMessage, FinalizeOp, FinalizePayload, MessageEnvelope};
use strand_types::primitives::{account_id, AccountId, Address, Amount, ChainId, Timestamp};

use crate::error::StakingError;
use crate::ledger::StakingLedger;

/// The staking endpoint on the chain that owns the authoritative ledger.
///
/// Local stakers move tokens in and out of the vault directly. Remote stakers
/// reach the ledger through allow-listed relays; their principal never touches
/// this chain — it sits in relay custody on the origin chain — so remote
/// operations mutate the ledger only and answer with a finalize hop.
pub struct StakingHome {
    chain_id: ChainId,
    vault: Address,
    ledger: StakingLedger,
    relays: BTreeSet<Address>,
    /// Principal physically held in the vault for home-chain stakers.
    local_staked: Amount,
}

impl StakingHome {
    pub fn new(chain_id: ChainId, vault: Address, duration: u64) -> Result<Self, StakingError> {
        Ok(Self {
            chain_id,
            vault,
            ledger: StakingLedger::new(duration)?,
            relays: BTreeSet::new(),
            local_staked: 0,
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn vault(&self) -> &Address {
        &self.vault
    }

    pub fn ledger(&self) -> &StakingLedger {
        &self.ledger
    }

    fn require_admin(&self, gate: &dyn PermissionGate, actor: &Address) -> Result<(), StakingError> {
        if !gate.is_authorized(actor, Role::Admin) {
            return Err(StakingError::NotAuthorized {
                reason: "caller is not an admin".to_string(),
            });
        }
        Ok(())
    }

    /// Allow-list a relay address.
    pub fn add_relay(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        relay: Address,
    ) -> Result<(), StakingError> {
        self.require_admin(gate, admin)?;
        self.relays.insert(relay);
        Ok(())
    }

    /// Remove a relay from the allow-list.
    pub fn remove_relay(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        relay: &Address,
    ) -> Result<(), StakingError> {
        self.require_admin(gate, admin)?;
        self.relays.remove(relay);
        Ok(())
    }

    pub fn is_relay(&self, relay: &Address) -> bool {
        self.relays.contains(relay)
    }

    /// Reward tokens held in the vault beyond local staked principal.
    fn reward_balance(&self, token: &dyn TokenPort) -> Amount {
        token
            .balance_of(&self.vault)
            .saturating_sub(self.local_staked)
    }

    /// Fund and start (or extend) a reward period. The reward tokens move into
    /// the vault first; the schedule is validated against what the vault
    /// actually holds.
    pub fn notify_reward(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        token: &mut dyn TokenPort,
        now: Timestamp,
        amount: Amount,
    ) -> Result<(), StakingError> {
        self.require_admin(gate, admin)?;
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let vault = self.vault;
        token.transfer(admin, &vault, amount)?;
        let reward_balance = self.reward_balance(token);
        self.ledger.notify_reward(now, amount, reward_balance)?;
        info!(
            amount,
            rate = self.ledger.reward_rate(),
            finish_at = self.ledger.finish_at(),
            "reward period funded"
        );
        Ok(())
    }

    /// Change the reward period length. Only allowed between periods.
    pub fn set_duration(
        &mut self,
        gate: &dyn PermissionGate,
        admin: &Address,
        now: Timestamp,
        duration: u64,
    ) -> Result<(), StakingError> {
        self.require_admin(gate, admin)?;
        self.ledger.set_duration(now, duration)
    }

    /// Stake from a home-chain wallet. Principal moves into the vault.
    pub fn stake_local(
        &mut self,
        token: &mut dyn TokenPort,
        now: Timestamp,
        account: &Address,
        amount: Amount,
    ) -> Result<(), StakingError> {
        let id = account_id(self.chain_id, account);
        let vault = self.vault;
        token.transfer(account, &vault, amount)?;
        self.ledger.stake(now, id, amount)?;
        self.local_staked += amount;
        Ok(())
    }

    /// Unstake to a home-chain wallet. Principal moves out of the vault.
    pub fn unstake_local(
        &mut self,
        token: &mut dyn TokenPort,
        now: Timestamp,
        account: &Address,
        amount: Amount,
    ) -> Result<(), StakingError> {
        let id = account_id(self.chain_id, account);
        self.ledger.unstake(now, id, amount)?;
        let vault = self.vault;
        token.transfer(&vault, account, amount)?;
        self.local_staked -= amount;
        Ok(())
    }

    /// Claim accrued rewards to a home-chain wallet, paid from the vault.
    pub fn claim_local(
        &mut self,
        token: &mut dyn TokenPort,
        now: Timestamp,
        account: &Address,
    ) -> Result<Amount, StakingError> {
        let id = account_id(self.chain_id, account);
        let reward = self.ledger.claim(now, id)?;
        if reward > 0 {
            let vault = self.vault;
            token.transfer(&vault, account, reward)?;
        }
        Ok(reward)
    }

    /// Staked balance for an account identity, local or mirrored.
    pub fn staked_balance(&self, account: &AccountId) -> Amount {
        self.ledger.balance_of(account)
    }

    /// Accrued, unclaimed reward for an account identity.
    pub fn earned(&self, now: Timestamp, account: &AccountId) -> Amount {
        self.ledger.earned(now, account)
    }

    /// Handle an inbound cross-chain staking request.
    ///
    /// The envelope is opened through the messenger, so redeliveries are
    /// dropped before any ledger mutation. The delivering relay must be
    /// allow-listed. On success the authoritative mutation has been applied
    /// and the returned finalize envelope completes the round trip on the
    /// origin chain.
    pub fn handle_message(
        &mut self,
        now: Timestamp,
        from_relay: &Address,
        env: &MessageEnvelope,
        messenger: &mut Messenger,
        token: &mut dyn TokenPort,
    ) -> Result<Vec<MessageEnvelope>, StakingError> {
        if !self.relays.contains(from_relay) {
            return Err(StakingError::NotAuthorized {
                reason: format!("relay {} is not allow-listed", hex::encode(from_relay)),
            });
        }
        let Some(msg) = messenger.open(env) else {
            return Ok(Vec::new());
        };

        let (op, amount, chain_id, account) = match msg {
            BridgeMessage::Stake(p) => {
                let id = account_id(p.chain_id, &p.account);
                self.ledger.stake(now, id, p.amount)?;
                debug!(
                    account = %hex::encode(id),
                    amount = p.amount,
                    "mirrored remote stake"
                );
                (FinalizeOp::Stake, p.amount, p.chain_id, p.account)
            }
            BridgeMessage::Unstake(p) => {
                let id = account_id(p.chain_id, &p.account);
                self.ledger.unstake(now, id, p.amount)?;
                debug!(
                    account = %hex::encode(id),
                    amount = p.amount,
                    "mirrored remote unstake"
                );
                (FinalizeOp::Unstake, p.amount, p.chain_id, p.account)
            }
            BridgeMessage::Claim(p) => {
                let id = account_id(p.chain_id, &p.account);
                let reward = self.ledger.claim(now, id)?;
                // The reward leaves this chain: burned from the vault here,
                // minted to the account by the relay on its home chain.
                if reward > 0 {
                    let vault = self.vault;
                    token.burn(&vault, reward)?;
                }
                debug!(
                    account = %hex::encode(id),
                    reward,
                    "settled remote claim"
                );
                (FinalizeOp::Claim, reward, p.chain_id, p.account)
            }
            other => {
                warn!(
                    message_type = other.discriminant(),
                    "ignoring non-staking message at staking endpoint"
                );
                return Ok(Vec::new());
            }
        };

        let reply = BridgeMessage::Finalize(FinalizePayload {
            op,
            request_id: env.id,
            amount,
            chain_id,
            account,
        });
        let reply_env = messenger.envelope(env.src_chain, &reply)?;
        Ok(vec![reply_env])
    }
}
