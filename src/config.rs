use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::common::ConfigError;

/// Width of the board shown before the first update arrives.
pub const DEFAULT_BOARD_WIDTH: u32 = 3;
/// Height of the board shown before the first update arrives.
pub const DEFAULT_BOARD_HEIGHT: u32 = 3;

/// Fixed wait between losing the connection and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1200);

/// Address of a locally running game server's spectator socket.
pub const DEFAULT_ADDRESS: &str = "ws://127.0.0.1:1313";

/// Server endpoint, selected by URL scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `ws://` or `wss://` URL; one WebSocket text message per frame.
    WebSocket(String),
    /// `tcp://host:port`; one newline-terminated line per frame.
    Tcp(String),
}

impl Endpoint {
    pub fn parse(address: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidAddress(address.to_owned());
        if let Some(rest) = address
            .strip_prefix("ws://")
            .or_else(|| address.strip_prefix("wss://"))
        {
            if rest.is_empty() || rest.starts_with('/') {
                return Err(invalid());
            }
            return Ok(Endpoint::WebSocket(address.to_owned()));
        }
        if let Some(host_port) = address.strip_prefix("tcp://") {
            let (host, port) = host_port.rsplit_once(':').ok_or_else(invalid)?;
            if host.is_empty() || port.parse::<u16>().is_err() {
                return Err(invalid());
            }
            return Ok(Endpoint::Tcp(host_port.to_owned()));
        }
        Err(invalid())
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::WebSocket(url) => f.write_str(url),
            Endpoint::Tcp(host_port) => write!(f, "tcp://{host_port}"),
        }
    }
}

/// Settings for one synchronized session.
///
/// The address is kept as given and only parsed when a connection is
/// attempted, so a bad address shows up as a failed attempt that is retried
/// like any other transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub address: String,
    pub retry_delay: Duration,
    pub initial_width: u32,
    pub initial_height: u32,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_initial_size(mut self, width: u32, height: u32) -> Self {
        self.initial_width = width;
        self.initial_height = height;
        self
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::parse(&self.address)
    }

    /// Check the whole configuration up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_width == 0 || self.initial_height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.initial_width,
                height: self.initial_height,
            });
        }
        self.endpoint().map(|_| ())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            retry_delay: DEFAULT_RETRY_DELAY,
            initial_width: DEFAULT_BOARD_WIDTH,
            initial_height: DEFAULT_BOARD_HEIGHT,
        }
    }
}
