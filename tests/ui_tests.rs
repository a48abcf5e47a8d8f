use std::collections::HashMap;

use boardsync::ui::{render_json, render_text};
use boardsync::{decode_frame, Color, ConnectionStatus, GameState, GameStateStore};

fn state() -> GameState {
    let palette = HashMap::from([('X', Color::RED), ('O', Color::WHITE)]);
    let store = GameStateStore::default();
    store.apply_update(decode_frame("BOARD 0 3 3 ...X.O...", &palette).unwrap());
    (*store.state()).clone()
}

#[test]
fn test_render_text() {
    let text = render_text(&state(), ConnectionStatus::Open);
    assert!(text.starts_with("TURN: 1\nSIZE: 3x3\nPIECES: 2\n"));
    assert!(text.contains("STATUS: Open"));
    assert!(text.ends_with("---\n...\nX.O\n...\n"));
}

#[test]
fn test_render_initial_state() {
    let text = render_text(&GameState::default(), ConnectionStatus::Connecting);
    assert!(text.starts_with("TURN: 0\n"));
    assert!(text.contains("STARTED: 1970-01-01T00:00:00+00:00"));
}

#[test]
fn test_render_json() {
    let line = render_json(&state(), ConnectionStatus::ReconnectPending).unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["status"], "ReconnectPending");
    assert_eq!(value["turn"], 1);
    assert_eq!(value["board"]["width"], 3);
    assert_eq!(value["board"]["pieces"][0]["color"], "#e01b24");
    assert!(!line.contains('\n'));
}

#[test]
fn test_render_text_full_layout() {
    let text = render_text(&GameState::default(), ConnectionStatus::Disconnected);
    assert_eq!(
        text,
        "TURN: 0\nSIZE: 3x3\nPIECES: 0\nSTARTED: 1970-01-01T00:00:00+00:00\nSTATUS: Disconnected\n---\n...\n...\n...\n"
    );
}
