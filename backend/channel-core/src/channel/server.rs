//! Channel server bootstrap and connection lifecycle.

use crate::channel::handle::{ChannelServerHandle, RawEvent};
use crate::channel::liveness;
use crate::channel::peer::{PeerId, PeerMap, PeerState};
use crate::error::CoreError;
use crate::error::channel::ChannelError;
use crate::port::{PortRange, find_open_port};
use crate::{CHANNEL_HOSTNAME, PING_DELAY};

use common::ErrorLocation;

use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind};
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, trace};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use uuid::Uuid;

/// Tunables for [`create_channel_server_with`].
///
/// Production callers use [`create_channel_server`], which takes the
/// compiled-in range both endpoints agree on. Tests inject a private range
/// and a short probe interval here.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    pub range: PortRange,
    pub ping_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            range: PortRange::default(),
            ping_delay: PING_DELAY,
        }
    }
}

/// Start a channel server on the first free port of the shared range.
///
/// Returns once the listener is bound and actively accepting, with the
/// liveness monitor attached. The bound port is not configurable - it is
/// whatever the allocator found, discoverable through
/// [`ChannelServerHandle::port`].
///
/// # Errors
///
/// - [`crate::error::port::PortError::Exhausted`] if no port in the range
///   is free.
/// - [`crate::error::port::PortError::Bind`] for any non-address-in-use
///   bind failure (not retried across ports).
pub async fn create_channel_server() -> Result<ChannelServerHandle, CoreError> {
    create_channel_server_with(ChannelConfig::default()).await
}

/// [`create_channel_server`] with an injected range and probe interval.
pub async fn create_channel_server_with(
    config: ChannelConfig,
) -> Result<ChannelServerHandle, CoreError> {
    let listener = find_open_port(
        config.range,
        |port| async move {
            trace!("Attempting to start websocket server on port {port}");
            TcpListener::bind((CHANNEL_HOSTNAME, port)).await
        },
        |error: &IoError| error.kind() == ErrorKind::AddrInUse,
    )
    .await?;

    let port = listener
        .local_addr()
        .map_err(ChannelError::from)?
        .port();
    debug!("Websocket server listening on port {port}");

    let peers: PeerMap = Arc::new(Mutex::new(HashMap::new()));
    let (event_sender, events) = unbounded_channel();

    let accept_task = TokioSpawn(accept_loop(listener, peers.clone(), event_sender));
    let liveness_task = TokioSpawn(liveness::monitor(peers.clone(), config.ping_delay));

    Ok(ChannelServerHandle::new(
        port,
        peers,
        events,
        accept_task,
        liveness_task,
    ))
}

/// Accept connections until the owning task is aborted on server close.
///
/// Accept errors are recorded at the server level and do not tear down
/// already-accepted peers.
async fn accept_loop(listener: TcpListener, peers: PeerMap, events: UnboundedSender<RawEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, address)) => {
                TokioSpawn(handle_connection(
                    stream,
                    address,
                    peers.clone(),
                    events.clone(),
                ));
            }
            Err(error) => error!("Websocket server error: {error}"),
        }
    }
}

/// Serve one peer connection from handshake to close.
///
/// The peer enters the map alive the instant the websocket handshake
/// completes and leaves it the instant the connection ends, whoever ends
/// it - the monitor, the peer, or a transport error.
async fn handle_connection(
    stream: TcpStream,
    address: SocketAddr,
    peers: PeerMap,
    events: UnboundedSender<RawEvent>,
) -> Result<(), ChannelError> {
    // The channel is loopback-only; anything else never reaches the map.
    if !address.ip().is_loopback() {
        debug!("Rejected non-loopback connection from {address}");
        return Ok(());
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(error) => {
            error!("Websocket handshake failed: {error}");
            return Err(ChannelError::Handshake {
                message: format!("Websocket handshake failed: {error}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let peer_id = Uuid::new_v4();
    debug!("Websocket connection started");

    let (outbound, outbox) = unbounded_channel();
    if let Ok(mut peers) = peers.lock() {
        peers.insert(peer_id, PeerState::new(outbound));
    }

    serve_peer(ws_stream, outbox, peer_id, &peers, &events).await;

    if let Ok(mut peers) = peers.lock() {
        peers.remove(&peer_id);
    }
    debug!("Websocket connection closed");

    Ok(())
}

/// Pump one peer's inbound frames and outbound queue until either ends.
///
/// The outbound queue closing means the peer was removed from the map (by
/// the monitor or by server close); the connection is then actively
/// closed rather than left half-open.
async fn serve_peer(
    mut ws_stream: WebSocketStream<TcpStream>,
    mut outbox: UnboundedReceiver<WsMessage>,
    peer_id: PeerId,
    peers: &PeerMap,
    events: &UnboundedSender<RawEvent>,
) {
    loop {
        tokio::select! {
            frame = ws_stream.next() => match frame {
                Some(Ok(WsMessage::Pong(_))) => mark_alive(peers, peer_id),
                Some(Ok(WsMessage::Close(_))) | None => break,
                // Pings are answered by the transport itself.
                Some(Ok(WsMessage::Ping(_))) => {}
                Some(Ok(frame)) => {
                    // Application payloads are forwarded raw; validation is
                    // the receiver's job at the protocol boundary.
                    let _ = events.send(RawEvent { peer: peer_id, frame });
                }
                Some(Err(error)) => {
                    error!("Websocket connection error: {error}");
                    break;
                }
            },
            queued = outbox.recv() => match queued {
                Some(frame) => {
                    if let Err(error) = ws_stream.send(frame).await {
                        debug!("Websocket send failed: {error}");
                        break;
                    }
                }
                None => {
                    let _ = ws_stream.close(None).await;
                    break;
                }
            },
        }
    }
}

/// A pong forces the peer back to alive regardless of prior state.
fn mark_alive(peers: &PeerMap, peer_id: PeerId) {
    if let Ok(mut peers) = peers.lock() {
        if let Some(peer) = peers.get_mut(&peer_id) {
            peer.alive = true;
        }
    }
}
