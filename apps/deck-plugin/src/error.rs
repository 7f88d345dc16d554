use common::ErrorLocation;

use thiserror::Error;

/// Errors surfaced at the process entry point.
///
/// This is the only layer permitted to abort startup; everything below it
/// propagates structured errors up to here.
#[derive(Debug, Error)]
pub enum DeckPluginError {
    /// Error from this app's own wiring (logging, filesystem)
    #[error("Plugin Error: {message} {location}")]
    Plugin {
        message: String,
        location: ErrorLocation,
    },

    /// Error from channel-core operations (port allocation, bootstrap)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}
