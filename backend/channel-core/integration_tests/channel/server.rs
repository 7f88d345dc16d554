use crate::helpers::{connect_to_server, occupy_port, start_test_server, wait_until};

use channel_core::channel::client::connect_channel_client_with;
use channel_core::error::CoreError;
use channel_core::error::port::PortError;
use channel_core::port::PortRange;

use std::time::Duration;

use serial_test::serial;
use tokio::net::TcpListener;

const TEST_PING_DELAY: Duration = Duration::from_secs(30);

/// **VALUE**: Verifies bootstrap binds the first port of a fully free range.
///
/// **WHY THIS MATTERS**: The client scans from the range start, so a server that
/// binds anywhere later than necessary adds a failed dial per skipped port to
/// every client startup.
#[tokio::test]
#[serial]
async fn given_free_range_when_server_created_then_binds_range_start() {
    // GIVEN: A private range with nothing bound
    let range = PortRange::new(46660, 10);

    // WHEN: Creating the server
    let server = start_test_server(range, TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed on a free range");

    // THEN: It landed on the first candidate
    assert_eq!(server.port(), 46660);
    server.close();
}

/// **VALUE**: Verifies the allocator walks over occupied ports and binds the
/// first free one.
///
/// **WHY THIS MATTERS**: This is the whole point of the candidate range - the
/// previous process instance (or its peer) may still be holding earlier ports
/// after a crash or while shutting down.
#[tokio::test]
#[serial]
async fn given_first_ports_occupied_when_server_created_then_binds_next_free_port() {
    // GIVEN: The first three candidates held by other sockets
    let range = PortRange::new(46700, 10);
    let _taken = (
        occupy_port(46700).await,
        occupy_port(46701).await,
        occupy_port(46702).await,
    );

    // WHEN: Creating the server
    let server = start_test_server(range, TEST_PING_DELAY)
        .await
        .expect("bootstrap should skip occupied ports");

    // THEN: It landed just past the occupied prefix
    assert_eq!(server.port(), 46703);
    server.close();
}

/// **VALUE**: Verifies a fully occupied range fails bootstrap with the exhausted
/// error and leaves nothing bound.
///
/// **BUG THIS CATCHES**: A leaked listener from a failed bootstrap would make
/// every later discovery cycle in the same process family bind one port further
/// down the range until it runs out.
#[tokio::test]
#[serial]
async fn given_every_port_occupied_when_server_created_then_fails_with_exhausted_range() {
    // GIVEN: Every candidate in a two-port range held by other sockets
    let range = PortRange::new(46720, 2);
    let taken = (occupy_port(46720).await, occupy_port(46721).await);

    // WHEN: Creating the server
    let result = start_test_server(range, TEST_PING_DELAY).await;

    // THEN: Bootstrap fails naming the range
    let error = result.expect_err("bootstrap must fail on an exhausted range");
    assert!(matches!(
        error,
        CoreError::Port(PortError::Exhausted { range: r, .. }) if r == range
    ));

    // THEN: No socket from the failed bootstrap remains bound
    drop(taken);
    let rebound = TcpListener::bind(("127.0.0.1", 46720)).await;
    assert!(
        rebound.is_ok(),
        "Failed bootstrap must not leave a socket bound in the range"
    );
}

/// **VALUE**: Verifies the two endpoints actually rendezvous: the client scans
/// the shared range and finds the server without being told the port.
///
/// **WHY THIS MATTERS**: This is the system's only discovery mechanism. If the
/// scan-and-dial loop disagrees with the server's allocation in any way, the
/// two processes simply never meet.
#[tokio::test]
#[serial]
async fn given_server_on_later_port_when_client_scans_range_then_they_rendezvous() {
    // GIVEN: A server pushed to the second candidate of its range
    let range = PortRange::new(46740, 4);
    let _taken = occupy_port(46740).await;
    let server = start_test_server(range, TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    assert_eq!(server.port(), 46741);

    // WHEN: A client scans the same range
    let client = connect_channel_client_with(range)
        .await
        .expect("client should find the server in the range");

    // THEN: The server sees exactly one live peer
    assert!(
        wait_until(Duration::from_secs(2), || server.peers().len() == 1).await,
        "Server should register the connected peer"
    );

    drop(client);
    server.close();
}

/// **VALUE**: Verifies a client scanning a range with no server fails with the
/// exhausted error instead of hanging or panicking.
#[tokio::test]
#[serial]
async fn given_no_server_when_client_scans_range_then_fails_with_exhausted_range() {
    let range = PortRange::new(46760, 3);

    let result = connect_channel_client_with(range).await;

    assert!(matches!(
        result,
        Err(CoreError::Port(PortError::Exhausted { .. }))
    ));
}
