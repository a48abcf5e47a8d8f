//! Commonly used types and utilities for ease of import.

pub use crate::{
    BoardModel, ClientConfig, Color, ConnectionManager, ConnectionStatus, GameState,
    GameStateStore, Palette, PlayerPalette, Update,
};

pub use crate::transport::{in_memory, Connector, EndpointConnector, Transport};
