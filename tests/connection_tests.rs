use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use boardsync::{
    ClientConfig, Color, ConnectionManager, ConnectionStatus, DecodeError, GameStateStore, TransportEvent,
};

fn manager() -> ConnectionManager {
    let palette = HashMap::from([('X', Color::RED), ('O', Color::WHITE)]);
    ConnectionManager::new(ClientConfig::new("ws://game:1313"), GameStateStore::default(), palette)
}

fn open_manager() -> ConnectionManager {
    let mut manager = manager();
    assert!(manager.connect());
    manager.handle_event(TransportEvent::Opened);
    assert_eq!(manager.status(), ConnectionStatus::Open);
    manager
}

fn text(raw: &str) -> TransportEvent {
    TransportEvent::Text(raw.to_string())
}

#[test]
fn test_starts_disconnected() {
    let manager = manager();
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    assert!(!manager.is_connected());
    assert!(manager.retry_deadline().is_none());
    assert_eq!(manager.store().turn(), 0);
}

#[test]
fn test_connect_only_from_idle_states() {
    let mut manager = manager();
    assert!(manager.connect());
    assert_eq!(manager.status(), ConnectionStatus::Connecting);
    assert!(!manager.connect());

    manager.handle_event(TransportEvent::Opened);
    assert!(manager.is_connected());
    assert!(manager.handle().is_connected());
    assert!(!manager.connect());
}

#[test]
fn test_opened_outside_connecting_is_ignored() {
    let mut manager = manager();
    manager.handle_event(TransportEvent::Opened);
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
}

#[test]
fn test_board_frames_update_store() {
    let mut manager = open_manager();
    manager.handle_event(text("BOARD 0 3 3 ...X.O..."));
    manager.handle_event(text("BOARD 0 3 3 ........."));
    let state = manager.store().state();
    assert_eq!(state.turn, 2);
    assert_eq!(state.board.occupied(), 0);
}

#[test]
fn test_frames_outside_open_are_dropped() {
    let mut manager = manager();
    manager.handle_event(text("BOARD 0 3 3 ...X.O..."));
    manager.connect();
    manager.handle_event(text("BOARD 0 3 3 ...X.O..."));
    assert_eq!(manager.store().turn(), 0);
}

#[test]
fn test_malformed_frame_keeps_connection_and_state() {
    let mut manager = open_manager();
    manager.handle_event(text("BOARD 0 3 3 ...X.O..."));
    for raw in ["BOARD 0 3 3 ...", "BOARD abc 3 3 .........", "BOARD 0 3 3 ...Z.....", ""] {
        manager.handle_event(text(raw));
        assert_eq!(manager.status(), ConnectionStatus::Open, "{raw}");
    }
    let state = manager.store().state();
    assert_eq!(state.turn, 1);
    assert_eq!(state.board.occupied(), 2);
}

#[test]
fn test_unknown_commands_and_binary_frames_are_ignored() {
    let mut manager = open_manager();
    manager.handle_event(text("CHAT hello"));
    manager.handle_event(TransportEvent::Binary(b"BOARD 0 1 1 X".to_vec()));
    assert_eq!(manager.store().turn(), 0);
    assert!(manager.is_connected());
}

#[test]
fn test_close_arms_a_single_retry() {
    let mut manager = open_manager();
    manager.handle_event(TransportEvent::Closed);
    assert_eq!(manager.status(), ConnectionStatus::ReconnectPending);
    let deadline = manager.retry_deadline();
    assert!(deadline.is_some());

    manager.handle_event(TransportEvent::Error("reset".to_string()));
    manager.handle_event(TransportEvent::Closed);
    assert!(!manager.arm_retry());
    assert_eq!(manager.retry_deadline(), deadline);

    assert!(manager.retry_elapsed());
    assert_eq!(manager.status(), ConnectionStatus::Connecting);
    assert!(manager.retry_deadline().is_none());
    assert!(!manager.retry_elapsed());
}

#[test]
fn test_failed_attempt_schedules_retry() {
    let mut manager = manager();
    manager.connect();
    manager.handle_event(TransportEvent::Error("connection refused".to_string()));
    assert_eq!(manager.status(), ConnectionStatus::ReconnectPending);
    assert!(manager.retry_deadline().is_some());
}

#[test]
fn test_connect_while_pending_cancels_retry() {
    let mut manager = open_manager();
    manager.handle_event(TransportEvent::Closed);
    assert!(manager.connect());
    assert!(manager.retry_deadline().is_none());
    assert!(!manager.retry_elapsed());
}

#[test]
fn test_retry_deadline_uses_configured_delay() {
    let palette = HashMap::from([('X', Color::RED)]);
    let config = ClientConfig::new("ws://game:1313").with_retry_delay(Duration::from_secs(30));
    let mut manager = ConnectionManager::new(config, GameStateStore::default(), palette);
    manager.connect();
    manager.handle_event(TransportEvent::Closed);
    let deadline = manager.retry_deadline().unwrap();
    let remaining = deadline - tokio::time::Instant::now();
    assert!(remaining > Duration::from_secs(29) && remaining <= Duration::from_secs(30));
}

#[test]
fn test_disconnect_is_final() {
    let mut manager = open_manager();
    manager.handle_event(TransportEvent::Closed);
    manager.disconnect();
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    assert!(manager.is_stopped());
    assert!(manager.retry_deadline().is_none());
    assert!(!manager.retry_elapsed());
    assert!(!manager.connect());
    assert!(!manager.arm_retry());

    manager.handle_event(TransportEvent::Opened);
    manager.handle_event(TransportEvent::Closed);
    manager.handle_event(text("BOARD 0 1 1 X"));
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    assert_eq!(manager.store().turn(), 0);
}

#[test]
fn test_custom_handler_receives_arguments() {
    let mut manager = open_manager();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    manager.register_handler("chat", move |args| {
        log.borrow_mut().push(args.join(" "));
        Ok(())
    });
    manager.handle_event(text("CHAT hello there"));
    manager.handle_event(text("chat again"));
    assert_eq!(*seen.borrow(), vec!["hello there".to_string(), "again".to_string()]);
}

#[test]
fn test_failing_handler_only_drops_its_frame() {
    let mut manager = open_manager();
    manager.register_handler("SCORE", |_| Err(DecodeError::UnknownColorToken('?')));
    manager.handle_event(text("SCORE 10"));
    manager.handle_event(text("BOARD 0 1 1 X"));
    assert!(manager.is_connected());
    assert_eq!(manager.store().turn(), 1);
}

#[test]
fn test_listener_runs_for_dispatched_board() {
    let mut manager = open_manager();
    let turns = Rc::new(RefCell::new(Vec::new()));
    let seen = turns.clone();
    let _sub = manager.store().subscribe(move |state| seen.borrow_mut().push(state.turn));
    manager.handle_event(text("BOARD 0 1 1 X"));
    manager.handle_event(text("BOARD 0 1 1 ."));
    assert_eq!(*turns.borrow(), vec![1, 2]);
}
