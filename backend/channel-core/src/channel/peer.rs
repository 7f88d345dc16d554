//! Per-peer connection state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use uuid::Uuid;

/// Identifier of one accepted connection on the channel server.
pub type PeerId = Uuid;

/// Liveness state machine plus the outbound frame queue for one peer.
///
/// `alive` starts true on accept, is forced true by every pong, and is
/// cleared by each liveness sweep after probing. A peer found with it
/// still cleared on the next sweep is evicted.
#[derive(Debug)]
pub(crate) struct PeerState {
    pub(crate) alive: bool,
    pub(crate) outbound: UnboundedSender<WsMessage>,
}

impl PeerState {
    pub(crate) fn new(outbound: UnboundedSender<WsMessage>) -> Self {
        Self {
            alive: true,
            outbound,
        }
    }
}

/// The live peer set, owned by the channel server.
///
/// Mutated only by the accept path (insert), the connection close path
/// (remove), and the liveness sweep (remove) - always synchronously within
/// one lock hold, so no entry is ever observed half-updated.
pub(crate) type PeerMap = Arc<Mutex<HashMap<PeerId, PeerState>>>;
