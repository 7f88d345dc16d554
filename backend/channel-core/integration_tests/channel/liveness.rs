use crate::helpers::{connect_to_server, start_test_server, wait_until};

use channel_core::port::PortRange;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serial_test::serial;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Probe interval for liveness tests. Short enough to observe several
/// windows per test, long enough to not race the assertions.
const TEST_PING_DELAY: Duration = Duration::from_millis(200);

/// **VALUE**: Verifies a peer that answers every probe is never evicted.
///
/// **WHY THIS MATTERS**: The monitor exists to prune half-open connections. If
/// it ever evicts a healthy peer, the UI silently loses its control channel and
/// the user sees a deck that stopped responding for no reason.
#[tokio::test]
#[serial]
async fn given_responsive_peer_when_many_probe_windows_pass_then_peer_stays_connected() {
    // GIVEN: A server with a fast probe interval and one connected peer
    let server = start_test_server(PortRange::new(46780, 4), TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    let ws = connect_to_server(server.port()).await;

    // GIVEN: The peer keeps reading, so the transport answers every ping
    let reader = tokio::spawn(async move {
        let mut ws = ws;
        while let Some(Ok(_)) = ws.next().await {}
    });

    assert!(
        wait_until(Duration::from_secs(2), || server.peers().len() == 1).await,
        "Peer should be registered"
    );

    // WHEN: Several full probe windows elapse
    tokio::time::sleep(TEST_PING_DELAY * 5).await;

    // THEN: The peer is still in the live set
    assert_eq!(
        server.peers().len(),
        1,
        "A peer answering every probe must never be evicted"
    );

    server.close();
    reader.abort();
}

/// **VALUE**: Verifies a completely silent peer is evicted after two probe
/// windows, and not before its grace window expires.
///
/// **WHY THIS MATTERS**: This is the half-open connection case the monitor is
/// for - a peer process killed without a clean close. The kernel will happily
/// keep the socket "connected" for hours; the sweep must reclaim it within two
/// intervals.
#[tokio::test]
#[serial]
async fn given_silent_peer_when_two_probe_windows_pass_then_peer_is_evicted() {
    // GIVEN: A server and a peer that never reads, so it never answers pings
    let server = start_test_server(PortRange::new(46790, 4), TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    let _silent = connect_to_server(server.port()).await;

    assert!(
        wait_until(Duration::from_secs(2), || server.peers().len() == 1).await,
        "Peer should be registered"
    );

    // THEN: The peer survives its first probe window (two-strike-minus-one)
    tokio::time::sleep(TEST_PING_DELAY / 2).await;
    assert_eq!(
        server.peers().len(),
        1,
        "A silent peer must survive until it misses a second probe window"
    );

    // WHEN: Two full probe windows elapse
    // THEN: The peer disappears from the live set
    assert!(
        wait_until(TEST_PING_DELAY * 4, || server.peers().is_empty()).await,
        "A peer silent for two probe windows must be evicted"
    );

    server.close();
}

/// **VALUE**: Verifies the full state machine on one connection: answer the
/// first probe, then go silent, and get evicted two windows later.
///
/// **BUG THIS CATCHES**: A monitor that never demotes an once-alive peer back
/// to suspect (pong handling setting a sticky flag) would keep dead peers
/// forever as long as they answered a single early probe.
#[tokio::test]
#[serial]
async fn given_peer_answering_once_when_it_goes_silent_then_evicted_two_windows_later() {
    // GIVEN: A server and a peer that reads until the first ping arrives
    let server = start_test_server(PortRange::new(46800, 4), TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    let ws = connect_to_server(server.port()).await;

    let half_responsive = tokio::spawn(async move {
        let mut ws = ws;
        while let Some(Ok(frame)) = ws.next().await {
            if matches!(frame, WsMessage::Ping(_)) {
                // The transport queued the pong on read; flush it out, then
                // stop reading so later probes go unanswered.
                let _ = ws.flush().await;
                break;
            }
        }
        // Keep the connection open without polling it.
        ws
    });

    assert!(
        wait_until(Duration::from_secs(2), || server.peers().len() == 1).await,
        "Peer should be registered"
    );

    // WHEN: The first probe is answered
    let ws = half_responsive.await.expect("reader task should finish");

    // THEN: The peer is still connected after that window
    assert_eq!(
        server.peers().len(),
        1,
        "A peer that answered the last probe must stay connected"
    );

    // WHEN: It stays silent for two more probe windows
    // THEN: It is evicted
    assert!(
        wait_until(TEST_PING_DELAY * 5, || server.peers().is_empty()).await,
        "A peer that stopped answering must be evicted within two windows"
    );

    drop(ws);
    server.close();
}
