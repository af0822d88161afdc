use crate::Kind;
use serde::Serialize;

/// A single board cell: empty, occupied by a locked tetromino of some
/// `Kind`, or an indestructible penalty block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Locked(Kind),
    Penalty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
    pub fn is_penalty(&self) -> bool {
        matches!(self, Cell::Penalty)
    }
}

/// Serializes as `0` for empty, or the single-character kind tag
/// (`"X"` for penalty), matching the wire protocol's board encoding.
impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Cell::Empty => serializer.serialize_u8(0),
            Cell::Locked(kind) => serializer.serialize_str(kind.tag()),
            Cell::Penalty => serializer.serialize_str("X"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(Cell::default(), Cell::Empty);
        assert!(Cell::Empty.is_empty());
    }

    #[test]
    fn penalty_is_never_empty() {
        assert!(!Cell::Penalty.is_empty());
        assert!(Cell::Penalty.is_penalty());
    }

    #[test]
    fn cell_serializes_to_wire_tag() {
        assert_eq!(serde_json::to_string(&Cell::Empty).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Cell::Penalty).unwrap(), "\"X\"");
        assert_eq!(
            serde_json::to_string(&Cell::Locked(Kind::T)).unwrap(),
            "\"T\""
        );
    }
}
