use std::io::Error as IoError;
use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(test)]
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error(transparent)]
    IoError(#[from] IoError),

    #[error(transparent)]
    Protocol(#[from] crate::protocol::Error),

    #[error("data parse error: {0}")]
    BinRwError(#[from] binrw::Error),

    #[error("channel unavailable, likely dropped")]
    ChannelUnavailable,

    #[error("internal error")]
    Internal,

    #[error("a request is already in flight on this channel")]
    Busy,

    #[error("timeout waiting for response")]
    Timeout,

    #[error("device is not initialized yet")]
    NotInitialized,

    #[error("operation is not supported in the current device mode")]
    Mode,

    #[error("parameter out of valid range")]
    ParameterOutOfRange,

    #[error("invalid length")]
    InvalidLength,

    #[error("device reported error code {0}")]
    Device(i8),

    #[error("device does not support the requested feature")]
    FeatureUnavailable,

    #[error("disconnected")]
    Disconnected,

    #[error("not found")]
    NotFound,
}
