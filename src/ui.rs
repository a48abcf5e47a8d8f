//! Text rendering of game-state snapshots for the command-line client.

use crate::connection::ConnectionStatus;
use crate::store::GameState;

/// Render the side panel and the board, top row first.
pub fn render_text(state: &GameState, status: ConnectionStatus) -> String {
    let board = &state.board;
    format!(
        "TURN: {}\nSIZE: {}x{}\nPIECES: {}\nSTARTED: {}\nSTATUS: {:?}\n{}\n{}\n",
        state.turn,
        board.width(),
        board.height(),
        board.occupied(),
        board.session_start().to_rfc3339(),
        status,
        "-".repeat(board.width() as usize),
        board,
    )
}

#[derive(serde::Serialize)]
struct JsonLine<'a> {
    status: ConnectionStatus,
    #[serde(flatten)]
    state: &'a GameState,
}

/// Render one JSON line: the snapshot plus the connection status.
pub fn render_json(state: &GameState, status: ConnectionStatus) -> serde_json::Result<String> {
    serde_json::to_string(&JsonLine { status, state })
}
