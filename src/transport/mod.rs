//! Transport seam between the connection manager and concrete sockets.
//!
//! A [`Connector`] opens one connection per attempt; the resulting
//! [`Transport`] yields whole frames until the peer goes away.

use tokio::time::{timeout, Duration};

use crate::config::Endpoint;

pub mod in_memory;
pub mod tcp;
pub mod ws;

/// Default timeout for establishing a connection (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One transport message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Non-text payload; the connection manager ignores these.
    Binary(Vec<u8>),
}

#[async_trait::async_trait]
pub trait Transport: Send {
    /// Wait for the next frame. `Ok(None)` means the peer closed the
    /// connection cleanly.
    async fn recv(&mut self) -> anyhow::Result<Option<Frame>>;

    /// Close the connection from our side.
    async fn close(&mut self) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
pub trait Connector: Send {
    /// Open a new connection to `address`. A successful return means the
    /// transport is open.
    async fn connect(&mut self, address: &str) -> anyhow::Result<Box<dyn Transport>>;
}

/// Connector that picks the transport from the address scheme.
pub struct EndpointConnector {
    connect_timeout: Duration,
}

impl EndpointConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for EndpointConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Connector for EndpointConnector {
    async fn connect(&mut self, address: &str) -> anyhow::Result<Box<dyn Transport>> {
        let endpoint = Endpoint::parse(address)?;
        let connect_op = async {
            let transport: Box<dyn Transport> = match &endpoint {
                Endpoint::WebSocket(url) => Box::new(ws::WsTransport::connect(url).await?),
                Endpoint::Tcp(host_port) => Box::new(tcp::TcpTransport::connect(host_port.as_str()).await?),
            };
            anyhow::Ok(transport)
        };
        timeout(self.connect_timeout, connect_op)
            .await
            .map_err(|_| anyhow::anyhow!("Connect to {} timed out after {:?}", endpoint, self.connect_timeout))?
    }
}
