//! End-to-end round trips between a home-chain runtime and a remote-chain
//! runtime over a hand-driven (and deliberately lossy) delivery loop.

use strand_node::config::{GaugeConfig, NodeConfig, StakingConfig};
use strand_node::error::NodeError;
use strand_node::runtime::ChainRuntime;

use strand_bridge::error::BridgeError;
use strand_bridge::messenger::Messenger;
use strand_gauge::registry::GaugeKind;
use strand_types::collab::TokenPort;
use strand_types::constants::ONE_STRAND;
use strand_types::message::{BridgeMessage, FinalizeOp, FinalizePayload};
use strand_types::primitives::{account_id, Address, Amount, LimitDirection};

const HOME: u32 = 1;
const REMOTE: u32 = 2;
const ADMIN: Address = [0xAA; 20];
const USER: Address = [0x01; 20];
const HOUR: u64 = 3600;

fn home_runtime() -> ChainRuntime {
    let mut config = NodeConfig::default();
    config.chain_id = HOME;
    config.home_chain = HOME;
    config.relay.address = hex::encode([0xE1; 20]);
    config.gauge = Some(GaugeConfig {
        epoch_length: HOUR,
        total_reward_tokens: 1_000,
    });
    config.staking = Some(StakingConfig {
        vault: hex::encode([0xFF; 20]),
        rewards_duration: HOUR,
    });
    ChainRuntime::from_config(&config, ADMIN, 0).unwrap()
}

fn remote_runtime() -> ChainRuntime {
    let mut config = NodeConfig::default();
    config.chain_id = REMOTE;
    config.home_chain = HOME;
    config.relay.address = hex::encode([0xE2; 20]);
    config.gauge = None;
    config.staking = None;
    ChainRuntime::from_config(&config, ADMIN, 0).unwrap()
}

fn linked_pair() -> (ChainRuntime, ChainRuntime) {
    let mut home = home_runtime();
    let mut remote = remote_runtime();
    let remote_relay = *remote.relay().address();
    let home_relay = *home.relay().address();
    home.register_remote_relay(remote_relay).unwrap();
    remote.register_remote_relay(home_relay).unwrap();
    (home, remote)
}

#[test]
fn test_stake_earn_claim_round_trip() {
    let (mut home, mut remote) = linked_pair();
    let remote_relay = *remote.relay().address();
    let home_relay = *home.relay().address();

    // Stake from the remote chain: principal enters relay custody, the home
    // ledger mirrors the position, the finalize burns the custody.
    remote.token().fund(USER, 100 * ONE_STRAND);
    let request = remote.stake(USER, 100 * ONE_STRAND).unwrap();
    let replies = home.handle_envelope(0, &remote_relay, &request).unwrap();
    for env in &replies {
        remote.handle_envelope(0, &home_relay, env).unwrap();
    }
    assert_eq!(remote.relay().pending_count(), 0);
    assert_eq!(
        home.staking().unwrap().staked_balance(&account_id(REMOTE, &USER)),
        100 * ONE_STRAND
    );

    // Fund a one-hour reward period on the home chain.
    home.token().fund(ADMIN, 700 * ONE_STRAND);
    let gate = home.gate();
    let mut token = home.token();
    home.staking_mut()
        .unwrap()
        .notify_reward(&gate, &ADMIN, &mut token, 0, 700 * ONE_STRAND)
        .unwrap();

    // After the full period, claim from the remote chain. The reward is
    // burned from the home vault and minted to the user remotely.
    let claim = remote.claim(USER).unwrap();
    let replies = home.handle_envelope(HOUR, &remote_relay, &claim).unwrap();
    assert_eq!(replies.len(), 1);
    let BridgeMessage::Finalize(fin) = replies[0].unwrap_message().unwrap() else {
        panic!("expected finalize reply");
    };
    assert_eq!(fin.op, FinalizeOp::Claim);
    // Exact up to the integer-division residue of the per-second rate.
    assert!(700 * ONE_STRAND - fin.amount < HOUR as Amount);

    remote.handle_envelope(HOUR, &home_relay, &replies[0]).unwrap();
    assert_eq!(remote.token().balance_of(&USER), fin.amount);
}

#[test]
fn test_redelivered_request_and_reply_apply_once() {
    let (mut home, mut remote) = linked_pair();
    let remote_relay = *remote.relay().address();
    let home_relay = *home.relay().address();

    remote.token().fund(USER, 500);
    let request = remote.stake(USER, 500).unwrap();

    let first = home.handle_envelope(0, &remote_relay, &request).unwrap();
    assert_eq!(first.len(), 1);
    // At-least-once transport: the request arrives again.
    let second = home.handle_envelope(0, &remote_relay, &request).unwrap();
    assert!(second.is_empty());
    assert_eq!(
        home.staking().unwrap().staked_balance(&account_id(REMOTE, &USER)),
        500
    );

    remote.handle_envelope(0, &home_relay, &first[0]).unwrap();
    let custody_after = remote.token().balance_of(&remote_relay);
    // The reply arrives again too; custody is not burned twice.
    remote.handle_envelope(0, &home_relay, &first[0]).unwrap();
    assert_eq!(remote.token().balance_of(&remote_relay), custody_after);
    assert_eq!(remote.relay().pending_count(), 0);
}

#[test]
fn test_dropped_finalize_recovered_manually() {
    let (mut home, mut remote) = linked_pair();
    let remote_relay = *remote.relay().address();
    let home_relay = *home.relay().address();

    remote.token().fund(USER, 500);
    let request = remote.stake(USER, 500).unwrap();
    let replies = home.handle_envelope(0, &remote_relay, &request).unwrap();
    assert_eq!(replies.len(), 1);

    // The finalize reply is lost in transit. The custody stays recoverable.
    assert_eq!(remote.relay().pending_count(), 1);
    assert_eq!(remote.token().balance_of(&remote_relay), 500);

    let payload = FinalizePayload {
        op: FinalizeOp::Stake,
        request_id: request.id,
        amount: 500,
        chain_id: REMOTE,
        account: USER,
    };
    let gate = remote.gate();
    let mut token = remote.token();
    remote
        .relay_mut()
        .manual_finalize(&gate, &ADMIN, 0, &payload, &mut token)
        .unwrap();
    assert_eq!(remote.relay().pending_count(), 0);
    assert_eq!(remote.token().balance_of(&remote_relay), 0);

    // If the original reply surfaces later, there is nothing left to settle.
    let late = remote.handle_envelope(0, &home_relay, &replies[0]);
    assert!(matches!(
        late,
        Err(NodeError::Bridge(BridgeError::NoPendingTransfer(_)))
    ));
}

#[test]
fn test_unlisted_relay_cannot_consume_vote_delivery() {
    let (mut home, mut remote) = linked_pair();
    let remote_relay = *remote.relay().address();
    let gate = home.gate();

    let gauge_address: Address = [0x77; 20];
    let gauge = home
        .gauge_mut()
        .unwrap()
        .add_gauge(
            &gate,
            &ADMIN,
            GaugeKind::Liquidity,
            REMOTE,
            gauge_address,
            100 * ONE_STRAND,
        )
        .unwrap();
    home.gauge_mut().unwrap().set_genesis(&gate, &ADMIN, 1).unwrap();

    remote.token().fund(USER, 50);
    let vote = remote.send_vote(USER, gauge, 0, 50).unwrap();

    // An unlisted relay delivers the envelope first. The delivery is
    // rejected before the envelope id enters the dedup set.
    let intruder: Address = [0xDD; 20];
    let rejected = home.handle_envelope(10, &intruder, &vote);
    assert!(matches!(rejected, Err(NodeError::NotAuthorized { .. })));
    assert_eq!(home.gauge().unwrap().voting().gauge_power(0, &gauge), 0);

    // The allow-listed relay can still deliver the very same envelope.
    home.handle_envelope(10, &remote_relay, &vote).unwrap();
    assert_eq!(home.gauge().unwrap().voting().gauge_power(0, &gauge), 50);
}

#[test]
fn test_rate_limited_finalize_stays_retryable() {
    let mut config = NodeConfig::default();
    config.chain_id = REMOTE;
    config.home_chain = HOME;
    config.relay.address = hex::encode([0xE2; 20]);
    config.relay.limit_tokens = 0;
    config.gauge = None;
    config.staking = None;
    let mut remote = ChainRuntime::from_config(&config, ADMIN, 0).unwrap();

    let home_relay: Address = [0xE1; 20];
    remote.register_remote_relay(home_relay).unwrap();

    let request = remote.unstake(USER, 250).unwrap();
    let mut home_messenger = Messenger::new(HOME);
    let reply = home_messenger
        .envelope(
            REMOTE,
            &BridgeMessage::Finalize(FinalizePayload {
                op: FinalizeOp::Unstake,
                request_id: request.id,
                amount: 250,
                chain_id: REMOTE,
                account: USER,
            }),
        )
        .unwrap();

    // The mint limit is exhausted, so the settlement fails. The failure must
    // not consume the envelope id, or the transfer could never settle.
    let first = remote.handle_envelope(0, &home_relay, &reply);
    assert!(matches!(
        first,
        Err(NodeError::Bridge(BridgeError::RateLimitExceeded { .. }))
    ));
    assert_eq!(remote.relay().pending_count(), 1);

    // After the limit is raised, the redelivered reply settles normally.
    let gate = remote.gate();
    remote
        .relay_mut()
        .set_limit(&gate, &ADMIN, 0, LimitDirection::Mint, 1_000, 100)
        .unwrap();
    remote.handle_envelope(0, &home_relay, &reply).unwrap();
    assert_eq!(remote.token().balance_of(&USER), 250);
    assert_eq!(remote.relay().pending_count(), 0);
}

#[test]
fn test_cross_chain_vote_and_pull() {
    let (mut home, mut remote) = linked_pair();
    let remote_relay = *remote.relay().address();
    let gate = home.gate();

    // Register a remote liquidity gauge with a 100-token base reward.
    let gauge_address: Address = [0x77; 20];
    let gauge = home
        .gauge_mut()
        .unwrap()
        .add_gauge(
            &gate,
            &ADMIN,
            GaugeKind::Liquidity,
            REMOTE,
            gauge_address,
            100 * ONE_STRAND,
        )
        .unwrap();
    home.gauge_mut().unwrap().set_genesis(&gate, &ADMIN, 1).unwrap();

    // A remote holder votes during epoch 0 with relay-asserted power.
    remote.token().fund(USER, 50);
    let vote = remote.send_vote(USER, gauge, 0, 50).unwrap();
    home.handle_envelope(10, &remote_relay, &vote).unwrap();

    // Close the epoch and pull from the remote chain during epoch 1.
    home.gauge_mut()
        .unwrap()
        .finalize_epoch(&gate, &ADMIN, 10, 0)
        .unwrap();
    let pull = remote.send_pull(0, gauge, gauge_address).unwrap();
    home.handle_envelope(HOUR + 10, &remote_relay, &pull).unwrap();

    // Sole voter: the gauge collects its base reward plus the entire
    // voteable remainder of the 1000-token epoch budget.
    assert_eq!(
        home.token().balance_of(&gauge_address),
        1_000 * ONE_STRAND
    );

    // A redelivered pull cannot double-mint.
    let redelivered = home.handle_envelope(HOUR + 20, &remote_relay, &pull).unwrap();
    assert!(redelivered.is_empty());
    assert_eq!(
        home.token().balance_of(&gauge_address),
        1_000 * ONE_STRAND
    );
}
