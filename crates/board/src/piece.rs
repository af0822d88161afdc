use serde::Serialize;
use tetris_core::SPAWN_X;
use tetris_core::SPAWN_Y;

/// The seven tetromino kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Kind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Kind {
    pub const ALL: [Kind; 7] = [
        Kind::I,
        Kind::O,
        Kind::T,
        Kind::S,
        Kind::Z,
        Kind::J,
        Kind::L,
    ];

    /// Single-character wire tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Kind::I => "I",
            Kind::O => "O",
            Kind::T => "T",
            Kind::S => "S",
            Kind::Z => "Z",
            Kind::J => "J",
            Kind::L => "L",
        }
    }

    /// Spawn shape, rows listed top-down, `true` = filled. Always a
    /// square grid so rotation can operate in place.
    fn spawn_shape(&self) -> Vec<Vec<bool>> {
        match self {
            Kind::I => vec![
                vec![false, false, false, false],
                vec![true, true, true, true],
                vec![false, false, false, false],
                vec![false, false, false, false],
            ],
            Kind::O => vec![vec![true, true], vec![true, true]],
            Kind::T => vec![
                vec![false, true, false],
                vec![true, true, true],
                vec![false, false, false],
            ],
            Kind::S => vec![
                vec![false, true, true],
                vec![true, true, false],
                vec![false, false, false],
            ],
            Kind::Z => vec![
                vec![true, true, false],
                vec![false, true, true],
                vec![false, false, false],
            ],
            Kind::J => vec![
                vec![true, false, false],
                vec![true, true, true],
                vec![false, false, false],
            ],
            Kind::L => vec![
                vec![false, false, true],
                vec![true, true, true],
                vec![false, false, false],
            ],
        }
    }
}

/// A live, falling tetromino: kind, shape grid, and top-left board
/// position. Immutable except for position and shape rotation, which
/// always produce a new `Piece` rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: Kind,
    shape: Vec<Vec<bool>>,
    x: i32,
    y: i32,
}

impl Piece {
    /// Spawns a piece of `kind` at the fixed spawn position (3, 0).
    pub fn spawn(kind: Kind) -> Self {
        Self {
            shape: kind.spawn_shape(),
            kind,
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
    pub fn x(&self) -> i32 {
        self.x
    }
    pub fn y(&self) -> i32 {
        self.y
    }
    pub fn shape(&self) -> &[Vec<bool>] {
        &self.shape
    }

    /// Coordinates of filled cells in board space, (col, row) pairs.
    pub fn cells(&self) -> Vec<(i32, i32)> {
        self.shape
            .iter()
            .enumerate()
            .flat_map(|(row, line)| {
                line.iter().enumerate().filter_map(move |(col, &filled)| {
                    filled.then_some((self.x + col as i32, self.y + row as i32))
                })
            })
            .collect()
    }

    /// Returns a copy translated by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            kind: self.kind,
            shape: self.shape.clone(),
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns a copy rotated 90 degrees clockwise. `O` is a fixed point.
    /// No wall kicks: the caller is responsible for validating the
    /// result against the board and discarding it if invalid.
    pub fn rotated(&self) -> Self {
        if matches!(self.kind, Kind::O) {
            return self.clone();
        }
        let n = self.shape.len();
        let mut rotated = vec![vec![false; n]; n];
        for row in 0..n {
            for col in 0..n {
                rotated[col][n - 1 - row] = self.shape[row][col];
            }
        }
        Self {
            kind: self.kind,
            shape: rotated,
            x: self.x,
            y: self.y,
        }
    }
}
