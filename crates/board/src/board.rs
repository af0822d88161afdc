use crate::Cell;
use crate::Piece;
use serde::Serialize;
use tetris_core::Column;
use tetris_core::HEIGHT;
use tetris_core::LineCount;
use tetris_core::PENALTY_GAP_COLUMN;
use tetris_core::Row;
use tetris_core::WIDTH;

/// A 20x10 playfield. Row 0 is the top. Always exactly `HEIGHT * WIDTH`
/// cells; mutated only through `lock`, `clear_lines`, and
/// `inject_penalty`, each of which returns a new `Board`.
///
/// `#[serde(transparent)]` serializes this as the bare `rows` matrix —
/// a 20x10 array of cell tags, per the wire protocol's `board` field —
/// rather than `{"rows": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<Cell>>,
}

impl Board {
    /// An empty board of fixed dimensions.
    pub fn empty() -> Self {
        Self {
            rows: vec![vec![Cell::Empty; WIDTH]; HEIGHT],
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    fn cell(&self, row: Row, col: Column) -> Cell {
        self.rows[row][col]
    }

    fn in_bounds(col: i32, row: i32) -> bool {
        (0..WIDTH as i32).contains(&col) && (0..HEIGHT as i32).contains(&row)
    }

    /// True iff every filled cell of `piece` lands in-bounds on an
    /// empty board cell.
    pub fn is_valid(&self, piece: &Piece) -> bool {
        piece.cells().into_iter().all(|(col, row)| {
            Self::in_bounds(col, row) && self.cell(row as usize, col as usize).is_empty()
        })
    }

    /// Burns `piece` into the board. Cells above the board (negative
    /// row) are ignored; cells must otherwise be in-bounds, which the
    /// caller guarantees by only locking pieces that passed `is_valid`
    /// at least one row above their final resting position.
    pub fn lock(&self, piece: &Piece) -> Self {
        let mut rows = self.rows.clone();
        for (col, row) in piece.cells() {
            if row < 0 || !Self::in_bounds(col, row) {
                continue;
            }
            rows[row as usize][col as usize] = Cell::Locked(piece.kind());
        }
        Self { rows }
    }

    /// A row is full iff every cell is non-empty and at least one cell
    /// is not a penalty block (a penalty row always keeps one empty
    /// gap column, so it never satisfies this and can never self-clear).
    fn is_full(row: &[Cell]) -> bool {
        row.iter().all(|c| !c.is_empty()) && row.iter().any(|c| !c.is_penalty())
    }

    /// Removes every full row, prepending empty rows at the top to
    /// restore height. Returns the new board and the number cleared.
    pub fn clear_lines(&self) -> (Self, LineCount) {
        let mut remaining: Vec<Vec<Cell>> = self
            .rows
            .iter()
            .filter(|row| !Self::is_full(row))
            .cloned()
            .collect();
        let cleared = (HEIGHT - remaining.len()) as LineCount;
        let mut rows = vec![vec![Cell::Empty; WIDTH]; cleared as usize];
        rows.append(&mut remaining);
        (Self { rows }, cleared)
    }

    /// For each column, `20 - (index of topmost non-empty row)`, or 0
    /// if the column is empty.
    pub fn spectrum(&self) -> [u32; WIDTH] {
        let mut heights = [0u32; WIDTH];
        for col in 0..WIDTH {
            let top = (0..HEIGHT).find(|&row| !self.rows[row][col].is_empty());
            heights[col] = top.map(|row| (HEIGHT - row) as u32).unwrap_or(0);
        }
        heights
    }

    /// Pushes `count` penalty rows onto the bottom, each with every
    /// cell tagged `Penalty` except `PENALTY_GAP_COLUMN`, which stays
    /// empty so the row never clears. Rows pushed off the top are
    /// discarded.
    pub fn inject_penalty(&self, count: LineCount) -> Self {
        if count == 0 {
            return self.clone();
        }
        let mut penalty_row = vec![Cell::Penalty; WIDTH];
        penalty_row[PENALTY_GAP_COLUMN] = Cell::Empty;
        let mut rows = self.rows.clone();
        for _ in 0..count {
            rows.remove(0);
            rows.push(penalty_row.clone());
        }
        Self { rows }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}
