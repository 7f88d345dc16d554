//! Typed channel messages.
//!
//! The wire protocol is a closed set of exactly two tagged JSON shapes.
//! These types are the in-memory form; encoding and strict validation of
//! untrusted payloads live in `channel-core::protocol`.

/// Wire tag for the "deal the next card" message.
pub const CARD_MESSAGE: &str = "deal-card-next";

/// Wire tag for the card settings message.
pub const SETTINGS_MESSAGE: &str = "deal-card-settings";

/// A message exchanged over the control channel.
///
/// This is a closed union - the protocol validator rejects any wire
/// payload that is not one of these two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    /// Deal the next card. Carries no payload.
    CardNext,
    /// Update the card deck settings.
    CardSettings(DealCardSettings),
}

/// Settings payload for [`ChannelMessage::CardSettings`].
///
/// Both fields are optional on the wire, and for `card_back` absence is
/// semantically distinct from an explicit `null`:
///
/// - `None` - the field was absent
/// - `Some(None)` - the field was an explicit `null`
/// - `Some(Some(id))` - a card-back identifier
///
/// `card_faces` ordering is significant: it defines the face ordering for
/// downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DealCardSettings {
    pub card_back: Option<Option<String>>,
    pub card_faces: Option<Vec<String>>,
}
