//! Moves
//!
//! Castling is encoded as "king captures own rook": `to` is the rook's
//! square, in both standard chess and Chess960. Conversion to the
//! conventional king-landing square is a notation concern.

use super::{PieceType, Square};

/// Special-move tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal,
    Castling,
    EnPassant,
    Promotion(PieceType),
}

/// Immutable move value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    kind: MoveKind,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Move {
        Move { from, to, kind }
    }

    #[inline]
    pub const fn normal(from: Square, to: Square) -> Move {
        Move::new(from, to, MoveKind::Normal)
    }

    #[inline]
    pub const fn from(self) -> Square {
        self.from
    }

    #[inline]
    pub const fn to(self) -> Square {
        self.to
    }

    #[inline]
    pub const fn kind(self) -> MoveKind {
        self.kind
    }

    /// Promotion piece, if any
    #[inline]
    pub const fn promotion(self) -> Option<PieceType> {
        match self.kind {
            MoveKind::Promotion(pt) => Some(pt),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self.kind, MoveKind::Castling)
    }

    /// 16-bit packing for the transposition table: from(6) | to(6) | kind(2) | promotion(2)
    ///
    /// `0` never encodes a real move (a1a1).
    pub fn to_u16(self) -> u16 {
        let (kind, promo) = match self.kind {
            MoveKind::Normal => (0u16, 0u16),
            MoveKind::Promotion(pt) => (
                1,
                match pt {
                    PieceType::Bishop => 1,
                    PieceType::Rook => 2,
                    PieceType::Queen => 3,
                    _ => 0,
                },
            ),
            MoveKind::EnPassant => (2, 0),
            MoveKind::Castling => (3, 0),
        };
        self.from.index() as u16 | (self.to.index() as u16) << 6 | kind << 12 | promo << 14
    }

    pub fn from_u16(raw: u16) -> Option<Move> {
        if raw == 0 {
            return None;
        }
        let from = Square::from_index((raw & 0x3f) as usize)?;
        let to = Square::from_index(((raw >> 6) & 0x3f) as usize)?;
        let kind = match (raw >> 12) & 3 {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion(match raw >> 14 {
                1 => PieceType::Bishop,
                2 => PieceType::Rook,
                3 => PieceType::Queen,
                _ => PieceType::Knight,
            }),
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castling,
        };
        Some(Move::new(from, to, kind))
    }
}
