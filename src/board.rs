//! Board snapshot model and the decoder for its cell-string encoding.

use chrono::{DateTime, Utc};
use core::fmt;

use crate::common::DecodeError;
use crate::config::{DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};
use crate::palette::{Color, Palette};

/// Character marking an empty cell in the encoding.
pub const EMPTY_CELL: char = '.';

/// One placed token on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Piece {
    pub x: u32,
    pub y: u32,
    pub color: Color,
    /// Encoding character the piece was decoded from.
    pub key: char,
}

/// Immutable snapshot of the board as broadcast by the server.
///
/// Coordinates are top-row-first: `y == 0` is the top row. Each piece lies
/// inside `width` x `height` and no two pieces share a cell. A new model is
/// built for every accepted update; models are never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BoardModel {
    width: u32,
    height: u32,
    pieces: Vec<Piece>,
    session_start: DateTime<Utc>,
}

impl BoardModel {
    /// An all-empty board with a session start at the Unix epoch.
    ///
    /// Zero dimensions are clamped to one cell.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pieces: Vec::new(),
            session_start: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Decode a bottom-row-first cell string into a board.
    ///
    /// Cell `i` lands at `x = i % width`, `y = height - 1 - i / width`.
    /// [`EMPTY_CELL`] produces no piece; every other character is resolved
    /// through `palette`. Either the whole board decodes or an error is
    /// returned.
    pub fn decode<P: Palette + ?Sized>(
        cells: &str,
        width: u32,
        height: u32,
        session_start: DateTime<Utc>,
        palette: &P,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::malformed(format!(
                "board dimensions must be positive, got {width}x{height}"
            )));
        }
        let area = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| DecodeError::malformed(format!("board {width}x{height} is too large")))?;
        let len = cells.chars().count();
        if len != area {
            return Err(DecodeError::malformed(format!(
                "expected {area} cells for a {width}x{height} board, got {len}"
            )));
        }

        let mut pieces = Vec::new();
        for (i, key) in cells.chars().enumerate() {
            if key == EMPTY_CELL {
                continue;
            }
            let color = palette
                .resolve(key)
                .ok_or(DecodeError::UnknownColorToken(key))?;
            // `i < width * height`, so both coordinates fit in u32.
            let row = (i / width as usize) as u32;
            pieces.push(Piece {
                x: (i % width as usize) as u32,
                y: height - 1 - row,
                color,
                key,
            });
        }

        Ok(Self {
            width,
            height,
            pieces,
            session_start,
        })
    }

    /// Encode the board back into its bottom-row-first cell string.
    pub fn to_cells(&self) -> String {
        let mut cells = vec![EMPTY_CELL; self.width as usize * self.height as usize];
        for piece in &self.pieces {
            let row = (self.height - 1 - piece.y) as usize;
            cells[row * self.width as usize + piece.x as usize] = piece.key;
        }
        cells.into_iter().collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pieces in encoding order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    /// The piece occupying `(x, y)`, if any.
    pub fn piece_at(&self, x: u32, y: u32) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.x == x && p.y == y)
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.pieces.len()
    }
}

impl Default for BoardModel {
    fn default() -> Self {
        Self::empty(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT)
    }
}

impl fmt::Display for BoardModel {
    /// Top row first, one text line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = vec![EMPTY_CELL; self.width as usize * self.height as usize];
        for piece in &self.pieces {
            grid[piece.y as usize * self.width as usize + piece.x as usize] = piece.key;
        }
        for (y, row) in grid.chunks(self.width as usize).enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            for key in row {
                write!(f, "{key}")?;
            }
        }
        Ok(())
    }
}
