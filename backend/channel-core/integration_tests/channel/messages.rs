use crate::helpers::{connect_to_server, start_test_server, wait_until};

use channel_core::error::protocol::ProtocolError;
use channel_core::port::PortRange;
use channel_core::protocol::{receive_message, send_message};

use common::{ChannelMessage, DealCardSettings};

use std::time::Duration;

use futures_util::StreamExt;
use serial_test::serial;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Long enough that no probe fires during a message test.
const TEST_PING_DELAY: Duration = Duration::from_secs(30);

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// **VALUE**: Verifies a client frame travels through the server's event queue
/// and decodes back to the typed message that was sent.
///
/// **WHY THIS MATTERS**: This is the send/receive/connect surface the
/// presentation layers call into; everything else in the repo exists to carry
/// these few frames correctly.
#[tokio::test]
#[serial]
async fn given_connected_client_when_it_sends_card_next_then_server_decodes_it() {
    // GIVEN: A server and a connected client
    let mut server = start_test_server(PortRange::new(46820, 4), TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    let mut client = connect_to_server(server.port()).await;

    assert!(
        wait_until(EVENT_TIMEOUT, || server.peers().len() == 1).await,
        "Peer should be registered"
    );

    // WHEN: The client sends a card-next message
    send_message(&mut client, &ChannelMessage::CardNext)
        .await
        .expect("client send should succeed");

    // THEN: The server receives one raw event that validates to CardNext
    let event = tokio::time::timeout(EVENT_TIMEOUT, server.next_event())
        .await
        .expect("server should receive the frame in time")
        .expect("event queue should be open");
    assert_eq!(receive_message(&event.frame).unwrap(), ChannelMessage::CardNext);
    assert_eq!(
        server.peers(),
        vec![event.peer],
        "Event must be attributed to the connected peer"
    );

    server.close();
}

/// **VALUE**: Verifies a server broadcast reaches the peer and round-trips to a
/// deep-equal settings message.
#[tokio::test]
#[serial]
async fn given_connected_client_when_server_broadcasts_settings_then_client_decodes_them() {
    // GIVEN: A server and a connected client
    let server = start_test_server(PortRange::new(46830, 4), TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    let mut client = connect_to_server(server.port()).await;

    assert!(
        wait_until(EVENT_TIMEOUT, || server.peers().len() == 1).await,
        "Peer should be registered"
    );

    // WHEN: The server broadcasts a settings update
    let settings = ChannelMessage::CardSettings(DealCardSettings {
        card_back: Some(Some(String::from("red-weave"))),
        card_faces: Some(vec![String::from("ace-spades"), String::from("two-hearts")]),
    });
    server.broadcast(&settings);

    // THEN: The client receives a text frame that decodes deep-equal
    let frame = tokio::time::timeout(EVENT_TIMEOUT, client.next())
        .await
        .expect("client should receive the broadcast in time")
        .expect("stream should be open")
        .expect("frame should be readable");
    assert_eq!(receive_message(&frame).unwrap(), settings);

    server.close();
}

/// **VALUE**: Verifies an invalid payload fails only its own receive call - the
/// connection stays up and later frames still flow.
///
/// **WHY THIS MATTERS**: The validator guards a trust boundary, and the
/// documented failure scope is the single receive call. A malformed frame
/// must not cost the peer its connection, let alone the server its peers.
#[tokio::test]
#[serial]
async fn given_invalid_frame_when_received_then_connection_and_server_are_unaffected() {
    // GIVEN: A server and a connected client
    let mut server = start_test_server(PortRange::new(46840, 4), TEST_PING_DELAY)
        .await
        .expect("bootstrap should succeed");
    let mut client = connect_to_server(server.port()).await;

    assert!(
        wait_until(EVENT_TIMEOUT, || server.peers().len() == 1).await,
        "Peer should be registered"
    );

    // WHEN: The client sends a payload that validates to nothing
    use futures_util::SinkExt;
    client
        .send(WsMessage::text(r#"{"message":"deal-card-backwards"}"#))
        .await
        .expect("raw send should succeed");

    // THEN: The receive call fails with the documented error kind
    let event = tokio::time::timeout(EVENT_TIMEOUT, server.next_event())
        .await
        .expect("server should receive the frame in time")
        .expect("event queue should be open");
    assert!(matches!(
        receive_message(&event.frame),
        Err(ProtocolError::UnknownMessage { .. })
    ));

    // THEN: The peer is still connected and a valid frame still goes through
    assert_eq!(server.peers().len(), 1, "Invalid frame must not drop the peer");
    send_message(&mut client, &ChannelMessage::CardNext)
        .await
        .expect("client send should still succeed");
    let event = tokio::time::timeout(EVENT_TIMEOUT, server.next_event())
        .await
        .expect("server should receive the follow-up frame")
        .expect("event queue should be open");
    assert_eq!(receive_message(&event.frame).unwrap(), ChannelMessage::CardNext);

    server.close();
}
