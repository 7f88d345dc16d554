//! Test helpers for channel integration tests.
//!
//! Each test uses its own private port range well away from the production
//! range (and from the other tests), so occupying a port for one scenario
//! cannot interfere with another.

use channel_core::channel::{ChannelConfig, ChannelServerHandle, create_channel_server_with};
use channel_core::error::CoreError;
use channel_core::port::PortRange;

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Start a server over a private range with a short probe interval.
pub async fn start_test_server(
    range: PortRange,
    ping_delay: Duration,
) -> Result<ChannelServerHandle, CoreError> {
    create_channel_server_with(ChannelConfig { range, ping_delay }).await
}

/// Connect a websocket client straight to a known port.
pub async fn connect_to_server(port: u16) -> WebSocketStream<MaybeTlsStream<TcpStream>> {
    let url = format!("ws://127.0.0.1:{port}");
    let (ws_stream, _) = connect_async(&url)
        .await
        .expect("Failed to connect to websocket server");
    ws_stream
}

/// Hold a plain TCP listener on `port` so the allocator sees it as taken.
pub async fn occupy_port(port: u16) -> TcpListener {
    TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("test port expected to be free")
}

/// Poll until `condition` holds or `deadline` elapses.
///
/// Liveness transitions are timer-driven; polling with a deadline keeps the
/// tests deterministic without hardcoding sleeps tuned to the interval.
pub async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let poll = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    while waited < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(poll).await;
        waited += poll;
    }
    condition()
}
