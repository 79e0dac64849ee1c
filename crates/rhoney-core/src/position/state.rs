//! Position state snapshots and the game history built from them

use super::Position;
use crate::types::{Move, Piece};

/// Metadata of one position in the game: the part of a position the search
/// and the protocol layer need to look back at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    pub key: u64,
    pub rule50: u32,
    pub captured: Option<Piece>,
    pub last_move: Option<Move>,
}

/// Append-only sequence of snapshots, oldest first.
///
/// Never empty: it is seeded with the root position's snapshot, and the
/// position currently in use always corresponds to the last element.
#[derive(Debug, Clone)]
pub struct StateHistory {
    states: Vec<StateInfo>,
}

impl StateHistory {
    /// Start a fresh history rooted at `root`
    pub fn new(root: &Position) -> Self {
        Self {
            states: vec![root.state()],
        }
    }

    pub fn push(&mut self, state: StateInfo) {
        self.states.push(state);
    }

    /// Most recent snapshot
    pub fn last(&self) -> &StateInfo {
        &self.states[self.states.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateInfo> {
        self.states.iter()
    }

    /// Keys oldest first, handed to the search for repetition detection
    pub fn keys(&self) -> Vec<u64> {
        self.states.iter().map(|st| st.key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_history_is_seeded_and_tracks_last() {
        let pos = Position::startpos();
        let mut history = StateHistory::new(&pos);
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
        assert_eq!(history.last().key, pos.key());

        let e2 = Square::parse("e2").unwrap();
        let e4 = Square::parse("e4").unwrap();
        let next = pos.play(Move::normal(e2, e4));
        history.push(next.state());
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().key, next.key());
        assert_eq!(history.last().last_move, Some(Move::normal(e2, e4)));
        assert_eq!(history.keys(), vec![pos.key(), next.key()]);
    }
}
