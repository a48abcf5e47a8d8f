//! Latest game state plus the observer list that renderers subscribe to.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use crate::board::BoardModel;
use crate::config::ClientConfig;
use crate::protocol::Update;

/// Immutable snapshot handed to readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct GameState {
    pub board: BoardModel,
    /// Number of boards accepted since the session started.
    pub turn: u64,
}

/// Callback run after every accepted update.
pub type Listener = Box<dyn FnMut(&Rc<GameState>)>;

/// Token returned by [`GameStateStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping the token makes the listener impossible to remove"]
pub struct Subscription(u64);

struct Inner {
    state: Rc<GameState>,
    listeners: Vec<(u64, Listener)>,
    live: BTreeSet<u64>,
    next_id: u64,
    /// Set while listeners run; nested updates queue their snapshots.
    notifying: bool,
    pending: VecDeque<Rc<GameState>>,
}

/// Owner of the session's [`GameState`].
///
/// Cloning yields another handle to the same store. The store is meant for a
/// single thread: [`GameStateStore::apply_update`] is the only writer and
/// readers only ever see `Rc` snapshots.
#[derive(Clone)]
pub struct GameStateStore {
    inner: Rc<RefCell<Inner>>,
}

impl GameStateStore {
    pub fn new(board: BoardModel) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: Rc::new(GameState { board, turn: 0 }),
                listeners: Vec::new(),
                live: BTreeSet::new(),
                next_id: 0,
                notifying: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// Store holding an empty board sized by `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(BoardModel::empty(config.initial_width, config.initial_height))
    }

    /// Current snapshot.
    pub fn state(&self) -> Rc<GameState> {
        Rc::clone(&self.inner.borrow().state)
    }

    pub fn turn(&self) -> u64 {
        self.inner.borrow().state.turn
    }

    /// Apply a decoded update. Returns `true` when the state changed.
    ///
    /// A board update swaps in the new board and bumps the turn as one step,
    /// then runs every listener in registration order with the new snapshot.
    /// Listeners may read the store and subscribe or unsubscribe; a listener
    /// added during a notification first runs on the next update. An update
    /// applied from inside a listener is accepted at once, and its snapshot
    /// is delivered to every listener after the current round finishes, so
    /// each listener still sees every turn in order.
    pub fn apply_update(&self, update: Update) -> bool {
        let snapshot = match update {
            Update::Board { board } => {
                let mut inner = self.inner.borrow_mut();
                let turn = inner.state.turn + 1;
                inner.state = Rc::new(GameState { board, turn });
                Rc::clone(&inner.state)
            }
            Update::Ignored { keyword } => {
                log::debug!("ignoring {keyword} update");
                return false;
            }
        };
        log::debug!(
            "accepted {}x{} board, turn {}",
            snapshot.board.width(),
            snapshot.board.height(),
            snapshot.turn
        );
        self.notify(snapshot);
        true
    }

    /// Register `listener`; it runs after each accepted update.
    pub fn subscribe(&self, listener: impl FnMut(&Rc<GameState>) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.live.insert(id);
        inner.listeners.push((id, Box::new(listener)));
        Subscription(id)
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.live.remove(&subscription.0) {
            return false;
        }
        inner.listeners.retain(|(id, _)| *id != subscription.0);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().live.len()
    }

    fn notify(&self, snapshot: Rc<GameState>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.notifying {
                inner.pending.push_back(snapshot);
                return;
            }
            inner.notifying = true;
        }
        let mut next = Some(snapshot);
        while let Some(snapshot) = next {
            self.deliver(&snapshot);
            next = self.inner.borrow_mut().pending.pop_front();
        }
        self.inner.borrow_mut().notifying = false;
    }

    fn deliver(&self, snapshot: &Rc<GameState>) {
        // Listeners run without any borrow held so they can call back into
        // the store.
        let mut running = std::mem::take(&mut self.inner.borrow_mut().listeners);
        for (id, listener) in &mut running {
            let id = *id;
            if self.inner.borrow().live.contains(&id) {
                listener(snapshot);
            }
        }
        let mut inner = self.inner.borrow_mut();
        running.retain(|(id, _)| inner.live.contains(id));
        running.append(&mut inner.listeners);
        inner.listeners = running;
    }
}

impl Default for GameStateStore {
    fn default() -> Self {
        Self::new(BoardModel::default())
    }
}

impl std::fmt::Debug for GameStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("GameStateStore")
            .field("state", &inner.state)
            .field("listeners", &inner.live.len())
            .finish()
    }
}
