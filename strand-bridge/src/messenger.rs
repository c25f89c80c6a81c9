use std::collections::BTreeSet;

use tracing::{debug, warn};

use strand_types::error::StrandError;
use strand_types::message::{BridgeMessage, MessageEnvelope};
use strand_types::primitives::{ChainId, MessageId};

/// Chain-local message endpoint over an asynchronous, at-least-once transport.
///
/// Outbound messages get a monotonically increasing nonce folded into a
/// deterministic message id. Inbound envelopes are deduplicated by id before
/// dispatch, so a redelivered message — including a redelivered finalize — is
/// applied at most once.
///
/// The seen-set grows with the number of accepted envelopes and is retained
/// for the life of the instance; pruning ids whose round trips have settled
/// is left to the operator of a long-lived endpoint.
#[derive(Debug, Clone)]
pub struct Messenger {
    chain_id: ChainId,
    nonce: u64,
    seen: BTreeSet<MessageId>,
}

impl Messenger {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            nonce: 0,
            seen: BTreeSet::new(),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Wrap a message for the destination chain, consuming one nonce.
    pub fn envelope(
        &mut self,
        dest_chain: ChainId,
        msg: &BridgeMessage,
    ) -> Result<MessageEnvelope, StrandError> {
        let env = MessageEnvelope::wrap(msg, self.chain_id, dest_chain, self.nonce)?;
        self.nonce += 1;
        Ok(env)
    }

    /// Accept an inbound envelope, returning its message the first time only.
    ///
    /// Returns `None` for envelopes addressed elsewhere, redeliveries, and
    /// payloads with an unknown type (forward-compatible skip).
    pub fn open(&mut self, env: &MessageEnvelope) -> Option<BridgeMessage> {
        if env.dest_chain != self.chain_id {
            warn!(
                dest = env.dest_chain,
                local = self.chain_id,
                "dropping envelope addressed to another chain"
            );
            return None;
        }
        if !self.seen.insert(env.id) {
            debug!(id = %hex::encode(env.id), "dropping redelivered envelope");
            return None;
        }
        let msg = env.unwrap_message();
        if msg.is_none() {
            debug!(
                message_type = env.message_type,
                "dropping envelope with unknown message type"
            );
        }
        msg
    }

    /// Record an envelope id as handled without dispatching it.
    ///
    /// Lets a caller that validates before dispatch commit the id only once
    /// the dispatch outcome is settled, so a rejected delivery stays
    /// retryable.
    pub fn mark_seen(&mut self, id: MessageId) {
        self.seen.insert(id);
    }

    /// Whether an envelope id has already been accepted.
    pub fn has_seen(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }
}
