use std::str::Utf8Error;
use thiserror::Error;

/// Error types.
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(test)]
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error(transparent)]
    Utf8(#[from] Utf8Error),

    #[error("invalid length")]
    InvalidLength,

    #[error("frame checksum or length mismatch")]
    FrameCorrupt,

    #[error("parameter out of valid range")]
    ParameterOutOfRange,

    #[error("unknown product type: {0}")]
    UnknownProduct(u8),

    #[error("status payload too short for product dialect")]
    StatusTruncated,

    #[error("data parse error: {0}")]
    BinRwError(#[from] binrw::Error),
}
