//! Wire codec and validation for channel messages.
//!
//! Frames are single UTF-8 JSON text frames, one message per frame. This is
//! the channel's only trust boundary: everything read off the wire is
//! untrusted until it passes the validators below, which are a strict
//! allow-list - no coercion, no unknown tags, no unknown fields.

use crate::error::channel::ChannelError;
use crate::error::protocol::ProtocolError;

use common::{CARD_MESSAGE, ChannelMessage, DealCardSettings, ErrorLocation, SETTINGS_MESSAGE};

use std::panic::Location;

use futures_util::{Sink, SinkExt};
use serde_json::{Map, Value};
use tokio_tungstenite::tungstenite::Message as WsMessage;

const MESSAGE_KEY: &str = "message";
const DATA_KEY: &str = "data";
const CARD_BACK_KEY: &str = "cardBack";
const CARD_FACES_KEY: &str = "cardFaces";

/// Serialize a message to its wire form.
pub fn encode_message(message: &ChannelMessage) -> String {
    let mut object = Map::new();

    match message {
        ChannelMessage::CardNext => {
            object.insert(MESSAGE_KEY.to_string(), Value::String(CARD_MESSAGE.into()));
        }
        ChannelMessage::CardSettings(settings) => {
            object.insert(
                MESSAGE_KEY.to_string(),
                Value::String(SETTINGS_MESSAGE.into()),
            );

            let mut data = Map::new();
            if let Some(card_back) = &settings.card_back {
                let card_back = match card_back {
                    Some(id) => Value::String(id.clone()),
                    None => Value::Null,
                };
                data.insert(CARD_BACK_KEY.to_string(), card_back);
            }
            if let Some(card_faces) = &settings.card_faces {
                let card_faces = card_faces
                    .iter()
                    .map(|face| Value::String(face.clone()))
                    .collect();
                data.insert(CARD_FACES_KEY.to_string(), Value::Array(card_faces));
            }
            object.insert(DATA_KEY.to_string(), Value::Object(data));
        }
    }

    Value::Object(object).to_string()
}

/// Encode `message` and write it to `sink` as one text frame.
///
/// No acknowledgement is expected synchronously.
///
/// # Errors
///
/// Returns [`ChannelError::Send`] if the transport write fails.
pub async fn send_message<S>(sink: &mut S, message: &ChannelMessage) -> Result<(), ChannelError>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::fmt::Display,
{
    sink.send(WsMessage::text(encode_message(message)))
        .await
        .map_err(|error| ChannelError::Send {
            message: format!("Failed to send channel message: {error}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Decode and validate one inbound frame.
///
/// # Errors
///
/// - [`ProtocolError::MalformedPayload`] if the frame is not text, or the
///   text is not parseable JSON.
/// - [`ProtocolError::UnknownMessage`] if the JSON does not match one of
///   the recognized message shapes exactly.
pub fn receive_message(frame: &WsMessage) -> Result<ChannelMessage, ProtocolError> {
    let text = match frame {
        WsMessage::Text(text) => text.as_str(),
        other => {
            return Err(ProtocolError::MalformedPayload {
                message: format!("Invalid message data: expected text frame, got {other:?}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let value: Value =
        serde_json::from_str(text).map_err(|error| ProtocolError::MalformedPayload {
            message: format!("Invalid message data: {error}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    validate_message(&value).ok_or_else(|| ProtocolError::UnknownMessage {
        message: format!("Invalid message data: {text}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn validate_message(value: &Value) -> Option<ChannelMessage> {
    let object = value.as_object()?;

    match object.get(MESSAGE_KEY)?.as_str()? {
        CARD_MESSAGE => validate_card_next(object),
        SETTINGS_MESSAGE => validate_card_settings(object),
        _ => None,
    }
}

fn validate_card_next(object: &Map<String, Value>) -> Option<ChannelMessage> {
    // Only the tag itself is permitted at the top level.
    (object.len() == 1).then_some(ChannelMessage::CardNext)
}

fn validate_card_settings(object: &Map<String, Value>) -> Option<ChannelMessage> {
    if object.len() != 2 {
        return None;
    }

    let data = object.get(DATA_KEY)?.as_object()?;
    let mut settings = DealCardSettings::default();

    for (key, value) in data {
        match key.as_str() {
            CARD_BACK_KEY => {
                settings.card_back = Some(match value {
                    Value::Null => None,
                    Value::String(id) => Some(id.clone()),
                    _ => return None,
                });
            }
            CARD_FACES_KEY => {
                let faces = value.as_array()?;
                let mut card_faces = Vec::with_capacity(faces.len());
                for face in faces {
                    card_faces.push(face.as_str()?.to_string());
                }
                settings.card_faces = Some(card_faces);
            }
            _ => return None,
        }
    }

    Some(ChannelMessage::CardSettings(settings))
}
