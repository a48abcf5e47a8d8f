use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::transport::{Frame, Transport};

/// Maximum line length (1 MB) to prevent excessive memory allocation.
pub const MAX_LINE_LEN: usize = 1_000_000;

/// Newline-delimited text frames over TCP, as the game server speaks to
/// bots. Each line is one frame; `\r\n` endings and empty lines are
/// tolerated. Lines that are not UTF-8 surface as binary frames.
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    max_line_len: usize,
    line: Vec<u8>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_max_line_len(stream, MAX_LINE_LEN)
    }

    pub fn with_max_line_len(stream: TcpStream, max_line_len: usize) -> Self {
        Self {
            reader: BufReader::new(stream),
            max_line_len,
            line: Vec::new(),
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::ConnectionReset {
        anyhow::anyhow!("Connection reset by peer")
    } else {
        anyhow::anyhow!("Read error: {}", e)
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn recv(&mut self) -> anyhow::Result<Option<Frame>> {
        loop {
            self.line.clear();
            let limit = self.max_line_len as u64 + 1;
            let n = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.line)
                .await
                .map_err(read_error)?;
            if n == 0 {
                return Ok(None);
            }

            if self.line.last() != Some(&b'\n') {
                if n > self.max_line_len {
                    return Err(anyhow::anyhow!(
                        "Line too long: more than {} bytes",
                        self.max_line_len
                    ));
                }
                // Peer closed mid-line; the partial frame is dropped.
                return Ok(None);
            }

            self.line.pop();
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
            if self.line.is_empty() {
                continue;
            }

            let bytes = std::mem::take(&mut self.line);
            let frame = match String::from_utf8(bytes) {
                Ok(text) => Frame::Text(text),
                Err(e) => Frame::Binary(e.into_bytes()),
            };
            return Ok(Some(frame));
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.reader
            .get_mut()
            .shutdown()
            .await
            .map_err(|e| anyhow::anyhow!("Shutdown error: {}", e))
    }
}
