//! Handle to a running channel server.

use crate::channel::peer::{PeerId, PeerMap};
use crate::protocol::encode_message;

use common::ChannelMessage;

use log::debug;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// One frame received from a peer, not yet validated.
///
/// Pass `frame` to [`crate::protocol::receive_message`] to turn it into a
/// typed message or a protocol error.
#[derive(Debug)]
pub struct RawEvent {
    pub peer: PeerId,
    pub frame: WsMessage,
}

/// A running channel server.
///
/// Wraps exactly one bound listening socket for its entire lifetime; a
/// new discovery cycle must produce a new instance. Dropping the handle
/// (or calling [`close`](Self::close)) cancels the liveness timer, stops
/// accepting, and disconnects every peer.
#[derive(Debug)]
pub struct ChannelServerHandle {
    port: u16,
    peers: PeerMap,
    events: UnboundedReceiver<RawEvent>,
    accept_task: JoinHandle<()>,
    liveness_task: JoinHandle<()>,
}

impl ChannelServerHandle {
    pub(crate) fn new(
        port: u16,
        peers: PeerMap,
        events: UnboundedReceiver<RawEvent>,
        accept_task: JoinHandle<()>,
        liveness_task: JoinHandle<()>,
    ) -> Self {
        Self {
            port,
            peers,
            events,
            accept_task,
            liveness_task,
        }
    }

    /// The port the allocator found. This is how the caller learns where
    /// the server landed - peers never guess it.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Snapshot of the live peer set.
    pub fn peers(&self) -> Vec<PeerId> {
        match self.peers.lock() {
            Ok(peers) => peers.keys().copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Queue `message` for one peer.
    ///
    /// Sending to a peer that has already been removed is a silently
    /// logged no-op, never fatal to the server.
    pub fn send(&self, peer: PeerId, message: &ChannelMessage) {
        let encoded = encode_message(message);
        let Ok(peers) = self.peers.lock() else {
            return;
        };
        match peers.get(&peer) {
            Some(state) => {
                if state.outbound.send(WsMessage::text(encoded)).is_err() {
                    debug!("Dropped send to closing peer");
                }
            }
            None => debug!("Dropped send to removed peer"),
        }
    }

    /// Queue `message` for every connected peer.
    pub fn broadcast(&self, message: &ChannelMessage) {
        let encoded = encode_message(message);
        let Ok(peers) = self.peers.lock() else {
            return;
        };
        for state in peers.values() {
            let _ = state.outbound.send(WsMessage::text(encoded.clone()));
        }
    }

    /// Next raw frame from any peer, or `None` once the server is closed
    /// and the queue is drained.
    pub async fn next_event(&mut self) -> Option<RawEvent> {
        self.events.recv().await
    }

    /// Shut the server down: cancel the liveness timer, stop accepting,
    /// and disconnect every peer.
    pub fn close(self) {
        // Shutdown lives in Drop so an abandoned handle cleans up the
        // same way an explicit close does.
    }
}

impl Drop for ChannelServerHandle {
    fn drop(&mut self) {
        self.liveness_task.abort();
        self.accept_task.abort();
        if let Ok(mut peers) = self.peers.lock() {
            // Dropping each entry closes its outbound queue, which makes
            // the connection task close the socket.
            peers.clear();
        }
    }
}
