//! Domain models for the deal-deck control channel.
//!
//! This crate contains pure data structures representing the core
//! concepts shared by both channel endpoints. Models have no business
//! logic - they're just data that can be passed between layers.
//!
//! ## Architecture
//!
//! - **common** (this crate): Pure data structures
//! - **channel-core**: Channel bootstrap, liveness, and protocol logic
//! - **deck-plugin**: Application wiring everything together
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod error;
pub mod message;

pub use error::error_location::ErrorLocation;
pub use message::{CARD_MESSAGE, ChannelMessage, DealCardSettings, SETTINGS_MESSAGE};

#[cfg(test)]
mod tests;
