//! Text wire protocol spoken by the game server.
//!
//! A frame is one transport message made of space-separated tokens. The
//! first token, upper-cased, is the command keyword:
//!
//! ```text
//! BOARD <startEpochMs> <width> <height> <cells>
//! ```
//!
//! Every `BOARD` carries the full board, so a lost frame is repaired by the
//! next one. Keywords this client does not know are ignored.

use chrono::{DateTime, Utc};

use crate::board::BoardModel;
use crate::common::DecodeError;
use crate::palette::Palette;

/// Keyword of the full-board broadcast.
pub const BOARD_COMMAND: &str = "BOARD";

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Replace the board with a freshly decoded snapshot.
    Board { board: BoardModel },
    /// A command this client does not understand.
    Ignored { keyword: String },
}

/// Split a raw frame into its upper-cased keyword and positional arguments.
pub fn split_frame(raw: &str) -> (String, Vec<&str>) {
    let mut tokens = raw.split(' ');
    let keyword = tokens.next().unwrap_or_default().to_uppercase();
    (keyword, tokens.collect())
}

/// Decode one raw frame.
pub fn decode_frame<P: Palette + ?Sized>(raw: &str, palette: &P) -> Result<Update, DecodeError> {
    let (keyword, args) = split_frame(raw);
    decode_command(&keyword, &args, palette)
}

/// Decode the arguments of an already split frame.
///
/// `keyword` must be upper-case, as returned by [`split_frame`].
pub fn decode_command<P: Palette + ?Sized>(
    keyword: &str,
    args: &[&str],
    palette: &P,
) -> Result<Update, DecodeError> {
    match keyword {
        BOARD_COMMAND => decode_board(args, palette).map(|board| Update::Board { board }),
        _ => Ok(Update::Ignored {
            keyword: keyword.to_owned(),
        }),
    }
}

fn decode_board<P: Palette + ?Sized>(args: &[&str], palette: &P) -> Result<BoardModel, DecodeError> {
    let [start, width, height, cells] = args else {
        return Err(DecodeError::malformed(format!(
            "BOARD takes 4 arguments, got {}",
            args.len()
        )));
    };
    let start_ms: i64 = start
        .parse()
        .map_err(|_| DecodeError::malformed(format!("invalid session start {start:?}")))?;
    let session_start = DateTime::<Utc>::from_timestamp_millis(start_ms)
        .ok_or_else(|| DecodeError::malformed(format!("session start {start_ms} out of range")))?;
    let width = parse_dimension("width", width)?;
    let height = parse_dimension("height", height)?;
    BoardModel::decode(cells, width, height, session_start, palette)
}

fn parse_dimension(name: &str, value: &str) -> Result<u32, DecodeError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DecodeError::malformed(format!("invalid {name} {value:?}"))),
    }
}
