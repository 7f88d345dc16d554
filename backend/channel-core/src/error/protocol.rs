use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failures raised by `receive_message` for a single inbound frame.
///
/// Both variants are fatal to that one receive call only - the connection
/// and the server are unaffected, and the caller decides whether to drop
/// the message or the connection.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    /// The frame did not carry a textual payload, or the text was not
    /// parseable as JSON.
    #[error("Malformed Payload Error: {message} {location}")]
    MalformedPayload {
        message: String,
        location: ErrorLocation,
    },

    /// The payload parsed but did not match any recognized message shape.
    #[error("Unknown Message Error: {message} {location}")]
    UnknownMessage {
        message: String,
        location: ErrorLocation,
    },
}
