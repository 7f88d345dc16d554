//! Broken-connection detection.
//!
//! Half-open TCP connections (peer process killed without a clean close)
//! are invisible to a plain read loop and OS keepalive timers are too
//! coarse, so the server probes every peer with a transport-level ping on
//! a fixed interval. A peer that missed the previous probe's window is
//! terminated; everyone else is marked suspect and probed again. A peer
//! therefore survives as long as it answers at least once per two
//! intervals.

use crate::channel::peer::PeerMap;

use std::time::Duration;

use log::debug;
use tokio::time::{MissedTickBehavior, interval};
use tokio_tungstenite::tungstenite::{Bytes, Message as WsMessage};

/// Probe `peers` every `ping_delay` until the owning task is aborted.
///
/// Aborting the task (on server close) is what cancels the timer - no
/// further probes fire after that.
pub(crate) async fn monitor(peers: PeerMap, ping_delay: Duration) {
    let mut ticks = interval(ping_delay);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // An interval's first tick completes immediately; consume it so peers
    // get a full ping_delay before the first probe.
    ticks.tick().await;

    loop {
        ticks.tick().await;
        sweep(&peers);
    }
}

/// Evaluate every peer present at the start of this tick exactly once.
///
/// Eviction of one stale peer must not skip the remaining peers, so the
/// whole sweep is a single `retain` pass.
fn sweep(peers: &PeerMap) {
    let Ok(mut peers) = peers.lock() else {
        return;
    };

    peers.retain(|_, peer| {
        if !peer.alive {
            debug!("Terminating unresponsive client connection");
            // Dropping the entry closes the peer's outbound queue, which
            // closes the connection.
            return false;
        }

        peer.alive = false;
        let _ = peer.outbound.send(WsMessage::Ping(Bytes::new()));
        true
    });
}
