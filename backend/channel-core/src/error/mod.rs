pub mod channel;
pub mod port;
pub mod protocol;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Port(#[from] port::PortError),

    #[error(transparent)]
    Channel(#[from] channel::ChannelError),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),
}
