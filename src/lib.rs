mod board;
mod common;
mod config;
pub mod palette;
pub mod protocol;
mod store;
#[cfg(feature = "net")]
pub mod connection;
#[cfg(feature = "net")]
mod logging;
#[cfg(feature = "net")]
pub mod prelude;
#[cfg(feature = "net")]
pub mod transport;
#[cfg(feature = "net")]
pub mod ui;

pub use board::*;
pub use common::*;
pub use config::*;
pub use palette::{Color, Palette, PlayerPalette};
pub use protocol::{decode_frame, Update};
pub use store::*;
#[cfg(feature = "net")]
pub use connection::{ConnectionHandle, ConnectionManager, ConnectionStatus, TransportEvent};
#[cfg(feature = "net")]
pub use logging::init_logging;
#[cfg(feature = "net")]
pub use transport::{Connector, EndpointConnector, Frame, Transport};
