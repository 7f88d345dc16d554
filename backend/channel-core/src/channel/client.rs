//! Peer-side rendezvous.
//!
//! The client cannot be told the server's port - it scans the same
//! compiled-in candidate range the server allocated from, treating
//! connection-refused the way the server treats address-in-use: try the
//! next port. This is the same retry primitive as the server bootstrap,
//! pointed at a dial instead of a bind.

use crate::CHANNEL_BASE_URL;
use crate::error::CoreError;
use crate::port::{PortRange, find_open_port};

use std::io::ErrorKind;

use log::{debug, trace};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A client connection to the channel server.
pub type ChannelClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect to the channel server, wherever in the shared range it landed.
///
/// # Errors
///
/// - [`crate::error::port::PortError::Exhausted`] if no port in the range
///   accepted the connection.
/// - [`crate::error::port::PortError::Bind`] for any failure other than
///   connection-refused (handshake failures are not retried).
pub async fn connect_channel_client() -> Result<ChannelClientStream, CoreError> {
    connect_channel_client_with(PortRange::default()).await
}

/// [`connect_channel_client`] over an injected candidate range.
pub async fn connect_channel_client_with(
    range: PortRange,
) -> Result<ChannelClientStream, CoreError> {
    let ws_stream = find_open_port(
        range,
        |port| async move {
            trace!("Attempting websocket connection on port {port}");
            let (ws_stream, _response) = connect_async(format!("{CHANNEL_BASE_URL}:{port}")).await?;
            debug!("Websocket client connected on port {port}");
            Ok::<_, WsError>(ws_stream)
        },
        is_connection_refused,
    )
    .await?;

    Ok(ws_stream)
}

fn is_connection_refused(error: &WsError) -> bool {
    matches!(error, WsError::Io(io) if io.kind() == ErrorKind::ConnectionRefused)
}
