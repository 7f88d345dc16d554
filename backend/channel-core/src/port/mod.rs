//! Open-port discovery over a fixed candidate range.
//!
//! Both channel endpoints compile in the same range (6660-6669) and scan it
//! in ascending order - the server to find a port it can bind, the client to
//! find the port the server landed on. There is no separate discovery or
//! broadcast mechanism.
//!
//! [`find_open_port`] is deliberately generic over the attempt's success and
//! error types so the same retry policy wraps any "bind-like" operation,
//! not just sockets.

use crate::error::port::PortError;
use crate::{PORT_RANGE_LENGTH, PORT_RANGE_START};

use common::ErrorLocation;

use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::future::Future;
use std::panic::Location;

/// An immutable candidate port range `(start, length)`.
///
/// Ports are tried strictly in ascending order starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    length: u16,
}

impl PortRange {
    /// Create a range of `length` candidate ports starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if `length` is zero - an empty range could never allocate.
    pub const fn new(start: u16, length: u16) -> Self {
        assert!(length >= 1, "port range must contain at least one port");
        Self { start, length }
    }

    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Last candidate port, inclusive.
    pub const fn end(&self) -> u16 {
        self.start.saturating_add(self.length - 1)
    }

    /// Candidate ports in the order they must be attempted.
    pub fn ports(&self) -> impl Iterator<Item = u16> + use<> {
        self.start..=self.end()
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::new(PORT_RANGE_START, PORT_RANGE_LENGTH)
    }
}

impl Display for PortRange {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{} and {}", self.start(), self.end())
    }
}

/// Try `attempt` against each port in `range` until one succeeds.
///
/// Attempts are strictly sequential - each outcome is awaited before the
/// next candidate is tried, so two attempts never race for the same port.
///
/// Errors satisfying `is_unavailable` (the address-in-use condition for a
/// server, connection-refused for a client) advance to the next candidate.
/// Any other error is fatal and propagates immediately as
/// [`PortError::Bind`] without trying further ports. A failed attempt must
/// release whatever it transiently acquired; with `TcpListener` that is the
/// drop of the errored future's state, so no sockets leak across iterations.
///
/// # Errors
///
/// - [`PortError::Exhausted`] if every candidate was unavailable.
/// - [`PortError::Bind`] wrapping the first non-unavailable attempt error.
pub async fn find_open_port<T, E, F, Fut>(
    range: PortRange,
    mut attempt: F,
    is_unavailable: impl Fn(&E) -> bool,
) -> Result<T, PortError>
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: StdError + Send + Sync + 'static,
{
    for port in range.ports() {
        match attempt(port).await {
            Ok(value) => return Ok(value),
            Err(error) if is_unavailable(&error) => continue,
            Err(error) => {
                return Err(PortError::Bind {
                    message: error.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                    source: Box::new(error),
                });
            }
        }
    }

    Err(PortError::Exhausted {
        range,
        location: ErrorLocation::from(Location::caller()),
    })
}
