use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::transport::{Connector, Frame, Transport};

enum Event {
    Frame(Frame),
    Close,
    Fail(String),
}

#[derive(Default)]
struct Shared {
    attempts: usize,
    refuse: usize,
    addresses: Vec<String>,
    current: Option<UnboundedSender<Event>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a connector together with the server half that drives it.
pub fn pair() -> (InMemoryConnector, InMemoryServer) {
    let shared = Arc::new(Mutex::new(Shared::default()));
    (
        InMemoryConnector {
            shared: shared.clone(),
        },
        InMemoryServer { shared },
    )
}

/// Connector whose connections are fed by an [`InMemoryServer`].
pub struct InMemoryConnector {
    shared: Arc<Mutex<Shared>>,
}

/// Server side of an in-memory connection: pushes frames into the most
/// recent connection and can drop or refuse connections.
#[derive(Clone)]
pub struct InMemoryServer {
    shared: Arc<Mutex<Shared>>,
}

pub struct InMemoryTransport {
    events: UnboundedReceiver<Event>,
}

impl InMemoryServer {
    /// Send a text frame to the current connection. Returns `false` if no
    /// connection is open.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send(Event::Frame(Frame::Text(text.into())))
    }

    pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) -> bool {
        self.send(Event::Frame(Frame::Binary(bytes.into())))
    }

    /// Close the current connection cleanly.
    pub fn drop_connection(&self) -> bool {
        self.finish(Event::Close)
    }

    /// Break the current connection with a transport error.
    pub fn fail_connection(&self, reason: impl Into<String>) -> bool {
        self.finish(Event::Fail(reason.into()))
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        lock(&self.shared).refuse = n;
    }

    /// Number of connection attempts seen so far, refused ones included.
    pub fn connection_attempts(&self) -> usize {
        lock(&self.shared).attempts
    }

    /// Addresses passed to each connection attempt, in order.
    pub fn addresses(&self) -> Vec<String> {
        lock(&self.shared).addresses.clone()
    }

    /// Whether a connection is open and its client end still listening.
    pub fn is_connected(&self) -> bool {
        lock(&self.shared)
            .current
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn send(&self, event: Event) -> bool {
        lock(&self.shared)
            .current
            .as_ref()
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    fn finish(&self, event: Event) -> bool {
        let current = lock(&self.shared).current.take();
        current.is_some_and(|tx| tx.send(event).is_ok())
    }
}

#[async_trait::async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&mut self, address: &str) -> anyhow::Result<Box<dyn Transport>> {
        let mut shared = lock(&self.shared);
        shared.attempts += 1;
        shared.addresses.push(address.to_owned());
        if shared.refuse > 0 {
            shared.refuse -= 1;
            return Err(anyhow::anyhow!("Connection refused"));
        }
        let (tx, rx) = unbounded_channel();
        shared.current = Some(tx);
        Ok(Box::new(InMemoryTransport { events: rx }))
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn recv(&mut self) -> anyhow::Result<Option<Frame>> {
        match self.events.recv().await {
            Some(Event::Frame(frame)) => Ok(Some(frame)),
            Some(Event::Fail(reason)) => Err(anyhow::anyhow!(reason)),
            Some(Event::Close) | None => Ok(None),
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.events.close();
        Ok(())
    }
}
