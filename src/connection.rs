//! Connection lifecycle and reconnect state machine.
//!
//! ```text
//! Disconnected -> Connecting -> Open -> ReconnectPending -> Connecting -> ...
//! ```
//!
//! [`ConnectionManager`] keeps the transitions synchronous and free of any
//! socket: transport callbacks arrive as [`TransportEvent`]s and the retry
//! timer is a deadline the caller sleeps on. [`ConnectionManager::run`] is
//! the async driver that wires the machine to a [`Connector`].

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};

use crate::common::DecodeError;
use crate::config::ClientConfig;
use crate::palette::Palette;
use crate::protocol::{self, BOARD_COMMAND};
use crate::store::GameStateStore;
use crate::transport::{Connector, Frame, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Open,
    ReconnectPending,
}

/// What a transport reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    Binary(Vec<u8>),
    Closed,
    Error(String),
}

/// Handler for one command keyword; receives the frame's arguments.
pub type Handler = Box<dyn FnMut(&[&str]) -> Result<(), DecodeError>>;

struct Shared {
    status: Cell<ConnectionStatus>,
    shutdown: Notify,
}

/// Cloneable view of a manager for renderers and shutdown.
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Rc<Shared>,
}

impl ConnectionHandle {
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.get()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Open
    }

    /// Ask a running (or the next) [`ConnectionManager::run`] to close the
    /// transport and stop for good.
    pub fn disconnect(&self) {
        self.shared.shutdown.notify_one();
    }
}

pub struct ConnectionManager {
    config: ClientConfig,
    store: GameStateStore,
    handlers: HashMap<String, Handler>,
    retry_at: Option<Instant>,
    stopped: bool,
    shared: Rc<Shared>,
}

impl ConnectionManager {
    /// Build a manager whose `BOARD` frames feed `store`, with cells
    /// resolved through `palette`.
    pub fn new<P: Palette + 'static>(config: ClientConfig, store: GameStateStore, palette: P) -> Self {
        let mut manager = Self {
            config,
            store: store.clone(),
            handlers: HashMap::new(),
            retry_at: None,
            stopped: false,
            shared: Rc::new(Shared {
                status: Cell::new(ConnectionStatus::Disconnected),
                shutdown: Notify::new(),
            }),
        };
        manager.register_handler(BOARD_COMMAND, move |args| {
            let update = protocol::decode_command(BOARD_COMMAND, args, &palette)?;
            store.apply_update(update);
            Ok(())
        });
        manager
    }

    /// Route frames starting with `keyword` (any case) to `handler`,
    /// replacing an earlier handler for the same keyword.
    pub fn register_handler(
        &mut self,
        keyword: &str,
        handler: impl FnMut(&[&str]) -> Result<(), DecodeError> + 'static,
    ) {
        self.handlers.insert(keyword.to_uppercase(), Box::new(handler));
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.get()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Open
    }

    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    pub fn store(&self) -> &GameStateStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// When the pending retry fires, if one is armed.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Whether [`ConnectionManager::disconnect`] has ended this manager.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.shared.status.replace(status);
        if previous != status {
            log::debug!("connection {:?} -> {:?}", previous, status);
        }
    }

    /// Start a connection attempt: `Disconnected | ReconnectPending ->
    /// Connecting`. Returns `false` when already connecting or open, or
    /// once the manager has been stopped.
    pub fn connect(&mut self) -> bool {
        if self.stopped {
            log::debug!("ignoring connect on a stopped manager");
            return false;
        }
        match self.status() {
            ConnectionStatus::Disconnected | ConnectionStatus::ReconnectPending => {
                self.retry_at = None;
                self.set_status(ConnectionStatus::Connecting);
                log::info!("connecting to {}", self.config.address);
                true
            }
            ConnectionStatus::Connecting | ConnectionStatus::Open => false,
        }
    }

    /// Arm the retry timer. Arming while a retry is already pending does
    /// nothing and returns `false`.
    pub fn arm_retry(&mut self) -> bool {
        if self.stopped || self.retry_at.is_some() {
            return false;
        }
        self.retry_at = Some(Instant::now() + self.config.retry_delay);
        log::info!("retrying {} in {:?}", self.config.address, self.config.retry_delay);
        true
    }

    /// The retry timer fired. Returns `true` if a new attempt started.
    pub fn retry_elapsed(&mut self) -> bool {
        if self.retry_at.take().is_none() {
            return false;
        }
        self.connect()
    }

    /// Feed one transport event into the machine.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                if self.status() == ConnectionStatus::Connecting {
                    self.retry_at = None;
                    self.set_status(ConnectionStatus::Open);
                    log::info!("connected to {}", self.config.address);
                }
            }
            TransportEvent::Text(raw) => {
                if self.status() == ConnectionStatus::Open {
                    self.dispatch(&raw);
                } else {
                    log::debug!("dropping frame received while {:?}", self.status());
                }
            }
            TransportEvent::Binary(bytes) => {
                log::debug!("ignoring {} byte binary frame", bytes.len());
            }
            TransportEvent::Closed => self.connection_lost("connection closed"),
            TransportEvent::Error(reason) => self.connection_lost(&reason),
        }
    }

    fn connection_lost(&mut self, reason: &str) {
        match self.status() {
            ConnectionStatus::Open | ConnectionStatus::Connecting => {
                log::warn!("lost connection to {}: {}", self.config.address, reason);
                self.set_status(ConnectionStatus::ReconnectPending);
                self.arm_retry();
            }
            ConnectionStatus::ReconnectPending => {
                self.arm_retry();
            }
            ConnectionStatus::Disconnected => {}
        }
    }

    fn dispatch(&mut self, raw: &str) {
        let (keyword, args) = protocol::split_frame(raw);
        let Some(handler) = self.handlers.get_mut(&keyword) else {
            log::debug!("ignoring unknown command {:?}", keyword);
            return;
        };
        if let Err(e) = handler(args.as_slice()) {
            log::warn!("dropping {} frame: {}", keyword, e);
        }
    }

    /// Stop for good: cancel any pending retry, drop every handler and
    /// settle in `Disconnected`.
    pub fn disconnect(&mut self) {
        self.stopped = true;
        self.retry_at = None;
        self.handlers.clear();
        if self.status() != ConnectionStatus::Disconnected {
            log::info!("disconnected from {}", self.config.address);
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Drive the machine until [`ConnectionHandle::disconnect`] is called.
    ///
    /// Everything runs on the calling task: connection attempts, frames in
    /// arrival order, and the retry sleep.
    pub async fn run<C: Connector + ?Sized>(&mut self, connector: &mut C) {
        let shared = Rc::clone(&self.shared);
        if self.status() == ConnectionStatus::Disconnected {
            self.connect();
        }
        loop {
            if self.stopped {
                return;
            }
            match self.status() {
                ConnectionStatus::Disconnected => return,
                ConnectionStatus::Connecting => {
                    let address = self.config.address.clone();
                    let attempt = tokio::select! {
                        biased;
                        _ = shared.shutdown.notified() => {
                            self.disconnect();
                            return;
                        }
                        attempt = connector.connect(&address) => attempt,
                    };
                    match attempt {
                        Ok(transport) => {
                            self.handle_event(TransportEvent::Opened);
                            self.pump(transport).await;
                        }
                        Err(e) => self.handle_event(TransportEvent::Error(format!("{e:#}"))),
                    }
                }
                ConnectionStatus::ReconnectPending => {
                    let Some(deadline) = self.retry_at else {
                        self.arm_retry();
                        continue;
                    };
                    tokio::select! {
                        biased;
                        _ = shared.shutdown.notified() => {
                            self.disconnect();
                            return;
                        }
                        _ = sleep_until(deadline) => {
                            self.retry_elapsed();
                        }
                    }
                }
                ConnectionStatus::Open => self.handle_event(TransportEvent::Closed),
            }
        }
    }

    async fn pump(&mut self, mut transport: Box<dyn Transport>) {
        let shared = Rc::clone(&self.shared);
        loop {
            let next = tokio::select! {
                biased;
                _ = shared.shutdown.notified() => None,
                frame = transport.recv() => Some(frame),
            };
            match next {
                None => {
                    if let Err(e) = transport.close().await {
                        log::debug!("error closing transport: {:#}", e);
                    }
                    self.disconnect();
                    return;
                }
                Some(Ok(Some(Frame::Text(raw)))) => self.handle_event(TransportEvent::Text(raw)),
                Some(Ok(Some(Frame::Binary(bytes)))) => self.handle_event(TransportEvent::Binary(bytes)),
                Some(Ok(None)) => {
                    self.handle_event(TransportEvent::Closed);
                    return;
                }
                Some(Err(e)) => {
                    self.handle_event(TransportEvent::Error(format!("{e:#}")));
                    return;
                }
            }
        }
    }
}
