use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::transport::{Frame, Transport};

/// WebSocket client transport; each text message is one frame.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| anyhow::anyhow!("WebSocket connect to {} failed: {}", url, e))?;
        Ok(Self { stream })
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> anyhow::Result<Option<Frame>> {
        loop {
            let Some(msg) = self.stream.next().await else {
                return Ok(None);
            };
            match msg {
                Ok(Message::Text(text)) => return Ok(Some(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Binary(bytes)) => return Ok(Some(Frame::Binary(bytes.to_vec()))),
                Ok(Message::Close(_)) => return Ok(None),
                // Pings are answered by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(None)
                }
                Err(e) => return Err(anyhow::anyhow!("WebSocket error: {}", e)),
            }
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("WebSocket close failed: {}", e)),
        }
    }
}
