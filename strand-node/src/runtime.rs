use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use strand_bridge::fee::FeeSchedule;
use strand_bridge::messenger::Messenger;
use strand_bridge::relay::TokenRelay;
use strand_gauge::controller::{GaugeController, PullOrigin, VoteOrigin};
use strand_staking::home::StakingHome;
use strand_types::collab::{PermissionGate, PowerSource, Role};
use strand_types::constants::ONE_STRAND;
use strand_types::message::{BridgeMessage, MessageEnvelope, RelayOptions};
use strand_types::primitives::{
    account_id, Address, Amount, ChainId, Epoch, GaugeId, LimitDirection, Timestamp,
};

use crate::config::{parse_address, NodeConfig};
use crate::dev::{DevGate, DevLedger};
use crate::error::NodeError;

/// Current unix time in seconds.
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// An inbound envelope together with the relay identity that delivered it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub from_relay: Address,
    pub envelope: MessageEnvelope,
}

/// Derived voting power: token balance plus staked balance.
struct DerivedPower<'a> {
    token: &'a DevLedger,
    staking: Option<&'a StakingHome>,
}

impl PowerSource for DerivedPower<'_> {
    fn total_power(&self, chain_id: ChainId, account: &Address) -> Amount {
        use strand_types::collab::TokenPort;
        let staked = self
            .staking
            .map(|s| s.staked_balance(&account_id(chain_id, account)))
            .unwrap_or(0);
        self.token.balance_of(account) + staked
    }
}

/// One chain's protocol instance: the local relay and messenger on every
/// chain, plus the authoritative gauge controller and staking endpoint on the
/// home chain.
///
/// All mutations run on a single consumer; handlers validate fully before
/// mutating and return outbound envelopes as values.
pub struct ChainRuntime {
    chain_id: ChainId,
    admin: Address,
    messenger: Messenger,
    relay: TokenRelay,
    gauge: Option<GaugeController>,
    staking: Option<StakingHome>,
    token: DevLedger,
    gate: DevGate,
}

impl ChainRuntime {
    pub fn from_config(config: &NodeConfig, admin: Address, now: Timestamp) -> Result<Self, NodeError> {
        let gate = DevGate::with_admin(admin);
        let token = DevLedger::new(config.token.supply_cap_tokens as Amount * ONE_STRAND);

        let relay_address = parse_address("relay.address", &config.relay.address)?;
        let mut relay = TokenRelay::new(config.chain_id, config.home_chain, relay_address);
        let limit = config.relay.limit_tokens as Amount * ONE_STRAND;
        for direction in [LimitDirection::Mint, LimitDirection::Burn] {
            relay.set_limit(&gate, &admin, now, direction, limit, config.relay.limit_duration)?;
        }
        relay.set_fees(
            &gate,
            &admin,
            FeeSchedule::new(config.relay.base_fee as Amount, config.relay.fee_per_byte as Amount),
        )?;

        let gauge = config
            .gauge
            .as_ref()
            .map(|g| {
                GaugeController::new(g.epoch_length, g.total_reward_tokens as Amount * ONE_STRAND)
            });
        let staking = config
            .staking
            .as_ref()
            .map(|s| {
                let vault = parse_address("staking.vault", &s.vault)?;
                StakingHome::new(config.chain_id, vault, s.rewards_duration).map_err(NodeError::from)
            })
            .transpose()?;

        info!(
            chain_id = config.chain_id,
            home_chain = config.home_chain,
            gauge = gauge.is_some(),
            staking = staking.is_some(),
            "chain runtime initialized"
        );
        Ok(Self {
            chain_id: config.chain_id,
            admin,
            messenger: Messenger::new(config.chain_id),
            relay,
            gauge,
            staking,
            token,
            gate,
        })
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Shared handle to the instance's token ledger.
    pub fn token(&self) -> DevLedger {
        self.token.clone()
    }

    pub fn gate(&self) -> DevGate {
        self.gate.clone()
    }

    pub fn relay(&self) -> &TokenRelay {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut TokenRelay {
        &mut self.relay
    }

    pub fn gauge(&self) -> Option<&GaugeController> {
        self.gauge.as_ref()
    }

    pub fn gauge_mut(&mut self) -> Option<&mut GaugeController> {
        self.gauge.as_mut()
    }

    pub fn staking(&self) -> Option<&StakingHome> {
        self.staking.as_ref()
    }

    pub fn staking_mut(&mut self) -> Option<&mut StakingHome> {
        self.staking.as_mut()
    }

    /// Allow-list a remote chain's relay with every component that accepts
    /// relayed actions.
    pub fn register_remote_relay(&mut self, relay: Address) -> Result<(), NodeError> {
        let gate = self.gate.clone();
        let admin = self.admin;
        self.gate.add_relay(relay);
        if let Some(gauge) = self.gauge.as_mut() {
            gauge.add_relay(&gate, &admin, relay)?;
        }
        if let Some(staking) = self.staking.as_mut() {
            staking.add_relay(&gate, &admin, relay)?;
        }
        Ok(())
    }

    /// Dispatch one inbound envelope, returning the envelopes it produces.
    pub fn handle_envelope(
        &mut self,
        now: Timestamp,
        from_relay: &Address,
        env: &MessageEnvelope,
    ) -> Result<Vec<MessageEnvelope>, NodeError> {
        if env.dest_chain != self.chain_id {
            warn!(
                dest = env.dest_chain,
                local = self.chain_id,
                "ignoring envelope addressed to another chain"
            );
            return Ok(Vec::new());
        }

        // Relay trust is established before the dedup set records the id, so
        // a delivery rejected here can be retried by an allow-listed relay.
        if !self.gate.is_authorized(from_relay, Role::Relay) {
            return Err(NodeError::NotAuthorized {
                reason: format!("relay {} is not allow-listed", hex::encode(from_relay)),
            });
        }

        // Staking requests go through the staking endpoint, which shares the
        // messenger's dedup path and produces the finalize reply itself.
        if BridgeMessage::is_staking_request(env.message_type) {
            if let Some(home) = self.staking.as_mut() {
                let mut token = self.token.clone();
                return Ok(home.handle_message(now, from_relay, env, &mut self.messenger, &mut token)?);
            }
        }

        if self.messenger.has_seen(&env.id) {
            debug!(id = %hex::encode(env.id), "dropping redelivered envelope");
            return Ok(Vec::new());
        }
        let Some(msg) = env.unwrap_message() else {
            // Unknown message type: recorded and skipped (forward compatibility).
            self.messenger.mark_seen(env.id);
            debug!(
                message_type = env.message_type,
                "dropping envelope with unknown message type"
            );
            return Ok(Vec::new());
        };
        match msg {
            BridgeMessage::Vote(p) => {
                if let Some(gauge) = self.gauge.as_mut() {
                    let source = DerivedPower {
                        token: &self.token,
                        staking: self.staking.as_ref(),
                    };
                    gauge.vote(
                        now,
                        VoteOrigin::Relayed {
                            relay: *from_relay,
                            account_id: p.account_id,
                            total_power: p.total_power,
                        },
                        &source,
                        p.gauge_id,
                        p.epoch,
                        p.power,
                    )?;
                } else {
                    warn!("ignoring vote: no gauge controller on this chain");
                }
            }
            BridgeMessage::Pull(p) => {
                if let Some(gauge) = self.gauge.as_mut() {
                    let mut minter = self.token.clone();
                    gauge.pull(
                        now,
                        PullOrigin::Relayed { relay: *from_relay },
                        p.epoch,
                        p.gauge_id,
                        p.gauge_address,
                        &mut minter,
                    )?;
                } else {
                    warn!("ignoring pull: no gauge controller on this chain");
                }
            }
            BridgeMessage::Finalize(p) => {
                let mut token = self.token.clone();
                self.relay.on_finalize(now, &p, &mut token)?;
            }
            BridgeMessage::Stake(_) | BridgeMessage::Unstake(_) | BridgeMessage::Claim(_) => {
                warn!("ignoring staking request: no staking endpoint on this chain");
            }
        }
        // The id is committed only after dispatch succeeded, so a failed
        // delivery (say a rate-limited finalize) stays retryable.
        self.messenger.mark_seen(env.id);
        Ok(Vec::new())
    }

    /// Initiate a cross-chain stake from a local wallet.
    pub fn stake(&mut self, account: Address, amount: Amount) -> Result<MessageEnvelope, NodeError> {
        let mut token = self.token.clone();
        Ok(self.relay.stake(
            &mut self.messenger,
            &mut token,
            account,
            amount,
            RelayOptions::default(),
        )?)
    }

    /// Initiate a cross-chain unstake to a local wallet.
    pub fn unstake(&mut self, account: Address, amount: Amount) -> Result<MessageEnvelope, NodeError> {
        Ok(self
            .relay
            .unstake(&mut self.messenger, account, amount, RelayOptions::default())?)
    }

    /// Initiate a cross-chain claim of accrued staking rewards.
    pub fn claim(&mut self, account: Address) -> Result<MessageEnvelope, NodeError> {
        Ok(self
            .relay
            .claim(&mut self.messenger, account, RelayOptions::default())?)
    }

    /// Relay a local account's vote toward the gauge chain.
    pub fn send_vote(
        &mut self,
        account: Address,
        gauge_id: GaugeId,
        epoch: Epoch,
        power: Amount,
    ) -> Result<MessageEnvelope, NodeError> {
        let source = DerivedPower {
            token: &self.token,
            staking: self.staking.as_ref(),
        };
        Ok(self
            .relay
            .send_vote(&mut self.messenger, &source, account, gauge_id, epoch, power)?)
    }

    /// Relay a local gauge's reward pull toward the gauge chain.
    pub fn send_pull(
        &mut self,
        epoch: Epoch,
        gauge_id: GaugeId,
        gauge_address: Address,
    ) -> Result<MessageEnvelope, NodeError> {
        Ok(self
            .relay
            .send_pull(&mut self.messenger, epoch, gauge_id, gauge_address)?)
    }

    /// Cast a home-chain vote with live power derivation.
    pub fn vote_local(
        &mut self,
        now: Timestamp,
        account: Address,
        gauge_id: GaugeId,
        epoch: Epoch,
        power: Amount,
    ) -> Result<(), NodeError> {
        let Some(gauge) = self.gauge.as_mut() else {
            return Err(NodeError::ConfigError {
                reason: "no gauge controller on this chain".to_string(),
            });
        };
        let source = DerivedPower {
            token: &self.token,
            staking: self.staking.as_ref(),
        };
        gauge.vote(
            now,
            VoteOrigin::Direct {
                chain_id: self.chain_id,
                account,
            },
            &source,
            gauge_id,
            epoch,
            power,
        )?;
        Ok(())
    }
}
