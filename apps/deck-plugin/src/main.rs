use deck_plugin::error::DeckPluginError;
use deck_plugin::logger::initialize as LoggerInitialize;

use channel_core::channel::create_channel_server;
use channel_core::protocol::receive_message;

use common::{ChannelMessage, ErrorLocation};

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;

use log::{debug, error, info, trace};

const LOG_DIR: &str = "logs";

#[tokio::main]
async fn main() -> Result<(), DeckPluginError> {
    let log_dir = PathBuf::from(LOG_DIR);
    create_dir_all(&log_dir).map_err(|e| DeckPluginError::Plugin {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    LoggerInitialize(&log_dir)?;

    info!("Deck plugin starting");

    // Fatal bootstrap errors (exhausted range, non-recoverable bind
    // failures) abort startup here and nowhere else.
    let mut server = create_channel_server()
        .await
        .map_err(|e| DeckPluginError::Core {
            message: format!("Failed to start control channel: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Control channel ready on port {}", server.port());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            event = server.next_event() => {
                let Some(event) = event else { break };
                match receive_message(&event.frame) {
                    Ok(ChannelMessage::CardNext) => {
                        trace!("Card advance requested by peer {}", event.peer);
                        server.broadcast(&ChannelMessage::CardNext);
                    }
                    Ok(ChannelMessage::CardSettings(settings)) => {
                        debug!("Relaying card settings to all peers");
                        server.broadcast(&ChannelMessage::CardSettings(settings));
                    }
                    // Fatal to this one message only; the peer keeps its
                    // connection and the caller decides nothing further.
                    Err(e) => error!("Discarding invalid channel message: {e}"),
                }
            }
        }
    }

    server.close();
    Ok(())
}
