//! WebSocket control channel between the two local processes.
//!
//! The server side owns one bound listener for its whole lifetime, tracks
//! the live peer set, and runs the liveness monitor. The client side scans
//! the same compiled-in port range until it finds the server. Neither side
//! ever configures or guesses the other's port.

pub mod client;
mod handle;
mod liveness;
mod peer;
mod server;

pub use client::connect_channel_client;
pub use handle::{ChannelServerHandle, RawEvent};
pub use peer::PeerId;
pub use server::{ChannelConfig, create_channel_server, create_channel_server_with};
