pub mod channel;
pub mod error;
pub mod port;
pub mod protocol;

#[cfg(test)]
mod tests;

use std::time::Duration;

pub const CHANNEL_HOSTNAME: &str = "127.0.0.1";
pub const CHANNEL_BASE_URL: &str = const_format::concatcp!("ws://", CHANNEL_HOSTNAME);

/// First candidate port both endpoints agree on out-of-band.
pub const PORT_RANGE_START: u16 = 6660;

/// Number of candidate ports tried before giving up.
pub const PORT_RANGE_LENGTH: u16 = 10;

/// Delay between liveness probes. A peer must answer at least once per
/// two intervals to stay connected.
pub const PING_DELAY: Duration = Duration::from_secs(30);
