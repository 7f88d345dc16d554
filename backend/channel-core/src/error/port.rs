use crate::port::PortRange;

use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PortError {
    /// A bind attempt failed for a reason other than the port being taken.
    /// Fatal to the whole allocation - remaining candidates are not tried.
    #[error("Bind Error: {message} {location}")]
    Bind {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Every candidate in the range was unavailable.
    #[error("Port Range Exhausted Error: failed to find open port between {range} {location}")]
    Exhausted {
        range: PortRange,
        location: ErrorLocation,
    },
}
