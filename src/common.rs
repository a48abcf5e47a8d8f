//! Common error types shared by the decoder, the store and configuration.

/// Errors produced while decoding a frame into an update.
///
/// Both variants are recovered locally: the frame is dropped, no state
/// changes and the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The frame has the wrong shape: token count, numeric fields or cell
    /// string length.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// A cell character has no palette mapping.
    #[error("unknown color token {0:?}")]
    UnknownColorToken(char),
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::MalformedFrame(reason.into())
    }
}

/// Errors raised while building a client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The server address is not a supported `ws://`, `wss://` or `tcp://` endpoint.
    #[error("invalid server address {0:?}")]
    InvalidAddress(String),
    /// Board dimensions must both be positive.
    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// A color was neither `#rrggbb` nor a known color name.
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    /// A palette override was not of the form `KEY=COLOR`.
    #[error("invalid palette entry {0:?}, expected KEY=COLOR")]
    InvalidPaletteEntry(String),
}
