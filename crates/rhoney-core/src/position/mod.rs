//! Position representation
//!
//! - `Position`: mailbox board, side to move, castling rook squares,
//!   en-passant square, move counters and Zobrist key
//! - `StateInfo` / `StateHistory`: per-move snapshots kept by the caller
//! - FEN parsing and output (X-FEN and Shredder-FEN castling fields)
//!
//! Positions are immutable from the outside: `play` returns a new snapshot.
//! Board array, king squares and key are only updated through `put` /
//! `remove` so they always agree with each other.

mod fen;
mod state;
mod zobrist;

use std::fmt;

pub use fen::{FenError, START_FEN};
pub use state::{StateHistory, StateInfo};
pub(crate) use zobrist::ZOBRIST;

use crate::types::{Color, Move, MoveKind, Piece, PieceType, Square};

pub(crate) const KNIGHT_STEPS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
pub(crate) const KING_STEPS: [(i8, i8); 8] =
    [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

/// Index into `castling_rooks[color]`
pub(crate) const KING_SIDE: usize = 0;
pub(crate) const QUEEN_SIDE: usize = 1;

/// Chess position
#[derive(Clone)]
pub struct Position {
    board: [Option<Piece>; Square::NUM],
    side_to_move: Color,
    /// Rooks that may still castle, `[color][KING_SIDE | QUEEN_SIDE]`
    castling_rooks: [[Option<Square>; 2]; Color::NUM],
    ep_square: Option<Square>,
    rule50: u32,
    game_ply: u32,
    chess960: bool,
    king_square: [Square; Color::NUM],
    key: u64,
    captured: Option<Piece>,
    last_move: Option<Move>,
}

impl Position {
    fn empty(chess960: bool) -> Self {
        Self {
            board: [None; Square::NUM],
            side_to_move: Color::White,
            castling_rooks: [[None; 2]; Color::NUM],
            ep_square: None,
            rule50: 0,
            game_ply: 0,
            chess960,
            king_square: [Square::E1, Square::E8],
            key: 0,
            captured: None,
            last_move: None,
        }
    }

    /// The standard starting position
    pub fn startpos() -> Self {
        match Self::from_fen(START_FEN, false) {
            Ok(pos) => pos,
            Err(e) => unreachable!("start FEN must parse: {e}"),
        }
    }

    // ---- accessors ----

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn rule50(&self) -> u32 {
        self.rule50
    }

    #[inline]
    pub fn game_ply(&self) -> u32 {
        self.game_ply
    }

    #[inline]
    pub fn is_chess960(&self) -> bool {
        self.chess960
    }

    #[inline]
    pub fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_square[color.index()]
    }

    #[inline]
    pub(crate) fn castling_rook(&self, color: Color, side: usize) -> Option<Square> {
        self.castling_rooks[color.index()][side]
    }

    /// Full-move number as written in FEN
    pub fn fullmove_number(&self) -> u32 {
        1 + self.game_ply.saturating_sub(u32::from(self.side_to_move == Color::Black)) / 2
    }

    /// Snapshot of the metadata that goes into a `StateHistory`
    pub fn state(&self) -> StateInfo {
        StateInfo {
            key: self.key,
            rule50: self.rule50,
            captured: self.captured,
            last_move: self.last_move,
        }
    }

    /// Iterate over occupied squares
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_on(sq).map(|p| (sq, p)))
    }

    /// True when the move captures something (en passant included)
    pub fn is_capture(&self, m: Move) -> bool {
        match m.kind() {
            MoveKind::EnPassant => true,
            MoveKind::Castling => false,
            _ => self.piece_on(m.to()).is_some(),
        }
    }

    // ---- attacks ----

    /// Is `sq` attacked by any piece of color `by`?
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        let is = |s: Option<Square>, kind: PieceType| {
            s.and_then(|s| self.piece_on(s)) == Some(Piece::new(by, kind))
        };

        let back = -by.forward();
        if is(sq.offset(-1, back), PieceType::Pawn) || is(sq.offset(1, back), PieceType::Pawn) {
            return true;
        }
        if KNIGHT_STEPS.iter().any(|&(df, dr)| is(sq.offset(df, dr), PieceType::Knight)) {
            return true;
        }
        if KING_STEPS.iter().any(|&(df, dr)| is(sq.offset(df, dr), PieceType::King)) {
            return true;
        }
        let slider = |dirs: &[(i8, i8)], kind: PieceType| {
            dirs.iter().any(|&(df, dr)| match self.first_piece_along(sq, df, dr) {
                Some(p) => p.color == by && (p.kind == kind || p.kind == PieceType::Queen),
                None => false,
            })
        };
        slider(&DIAGONALS, PieceType::Bishop) || slider(&ORTHOGONALS, PieceType::Rook)
    }

    fn first_piece_along(&self, from: Square, df: i8, dr: i8) -> Option<Piece> {
        let mut cur = from;
        while let Some(next) = cur.offset(df, dr) {
            if let Some(p) = self.piece_on(next) {
                return Some(p);
            }
            cur = next;
        }
        None
    }

    /// Squares of the pieces giving check to the side to move
    pub fn checkers(&self) -> Vec<Square> {
        let us = self.side_to_move;
        let ksq = self.king_square(us);
        self.pieces()
            .filter(|(_, p)| p.color != us)
            .filter(|&(sq, p)| self.piece_attacks(sq, p, ksq))
            .map(|(sq, _)| sq)
            .collect()
    }

    fn piece_attacks(&self, from: Square, piece: Piece, target: Square) -> bool {
        let df = target.file() as i8 - from.file() as i8;
        let dr = target.rank() as i8 - from.rank() as i8;
        match piece.kind {
            PieceType::Pawn => dr == piece.color.forward() && df.abs() == 1,
            PieceType::Knight => KNIGHT_STEPS.contains(&(df, dr)),
            PieceType::King => df.abs() <= 1 && dr.abs() <= 1 && (df, dr) != (0, 0),
            PieceType::Bishop => df.abs() == dr.abs() && df != 0 && self.ray_clear(from, target),
            PieceType::Rook => (df == 0) != (dr == 0) && self.ray_clear(from, target),
            PieceType::Queen => {
                ((df.abs() == dr.abs() && df != 0) || ((df == 0) != (dr == 0)))
                    && self.ray_clear(from, target)
            }
        }
    }

    /// No piece strictly between two aligned squares
    fn ray_clear(&self, from: Square, to: Square) -> bool {
        let df = (to.file() as i8 - from.file() as i8).signum();
        let dr = (to.rank() as i8 - from.rank() as i8).signum();
        let mut cur = from;
        while let Some(next) = cur.offset(df, dr) {
            if next == to {
                return true;
            }
            if self.piece_on(next).is_some() {
                return false;
            }
            cur = next;
        }
        false
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        let us = self.side_to_move;
        self.is_attacked(self.king_square(us), !us)
    }

    /// After `play`: true when the side that just moved left its king attacked
    #[inline]
    pub fn left_king_in_check(&self) -> bool {
        let mover = !self.side_to_move;
        self.is_attacked(self.king_square(mover), self.side_to_move)
    }

    // ---- making moves ----

    /// Apply a (legal) move and return the resulting position.
    pub fn play(&self, m: Move) -> Position {
        let mut next = self.clone();
        next.apply(m);
        next
    }

    fn apply(&mut self, m: Move) {
        let z = &*ZOBRIST;
        let us = self.side_to_move;
        let them = !us;

        if let Some(ep) = self.ep_square.take() {
            self.key ^= z.ep_file(ep.file());
        }
        self.key ^= self.castling_key();
        self.rule50 = self.rule50.saturating_add(1);
        self.game_ply = self.game_ply.saturating_add(1);
        self.captured = None;

        if m.is_castling() {
            let king_from = m.from();
            let rook_from = m.to();
            let king_side = rook_from.file() > king_from.file();
            let king_to = king_from.with_file(if king_side { 6 } else { 2 });
            let rook_to = king_from.with_file(if king_side { 5 } else { 3 });
            let king = self.remove(king_from);
            let rook = self.remove(rook_from);
            if let (Some(king), Some(rook)) = (king, rook) {
                self.put(king_to, king);
                self.put(rook_to, rook);
            }
            self.castling_rooks[us.index()] = [None, None];
        } else {
            let Some(piece) = self.remove(m.from()) else {
                debug_assert!(false, "no piece on {}", m.from());
                return;
            };

            let capture_sq = match m.kind() {
                MoveKind::EnPassant => m.to().offset(0, -us.forward()).unwrap_or(m.to()),
                _ => m.to(),
            };
            if let Some(captured) = self.remove(capture_sq) {
                self.captured = Some(captured);
                self.rule50 = 0;
                self.forget_castling_rook(them, capture_sq);
            }

            let placed = match m.promotion() {
                Some(pt) => Piece::new(us, pt),
                None => piece,
            };
            self.put(m.to(), placed);

            match piece.kind {
                PieceType::Pawn => {
                    self.rule50 = 0;
                    let double_push = m.from().rank().abs_diff(m.to().rank()) == 2;
                    if double_push && self.enemy_pawn_beside(m.to(), them) {
                        self.ep_square = m.from().offset(0, us.forward());
                    }
                }
                PieceType::King => self.castling_rooks[us.index()] = [None, None],
                PieceType::Rook => self.forget_castling_rook(us, m.from()),
                _ => {}
            }
        }

        self.key ^= self.castling_key();
        if let Some(ep) = self.ep_square {
            self.key ^= z.ep_file(ep.file());
        }
        self.side_to_move = them;
        self.key ^= z.side();
        self.last_move = Some(m);
    }

    fn enemy_pawn_beside(&self, sq: Square, enemy: Color) -> bool {
        let pawn = Some(Piece::new(enemy, PieceType::Pawn));
        [sq.offset(-1, 0), sq.offset(1, 0)]
            .into_iter()
            .flatten()
            .any(|s| self.piece_on(s) == pawn)
    }

    fn forget_castling_rook(&mut self, color: Color, sq: Square) {
        for slot in self.castling_rooks[color.index()].iter_mut() {
            if *slot == Some(sq) {
                *slot = None;
            }
        }
    }

    fn put(&mut self, sq: Square, piece: Piece) {
        self.board[sq.index()] = Some(piece);
        self.key ^= ZOBRIST.psq(piece, sq);
        if piece.kind == PieceType::King {
            self.king_square[piece.color.index()] = sq;
        }
    }

    fn remove(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.board[sq.index()].take()?;
        self.key ^= ZOBRIST.psq(piece, sq);
        Some(piece)
    }

    fn castling_key(&self) -> u64 {
        let mut key = 0;
        for color in Color::ALL {
            for side in [KING_SIDE, QUEEN_SIDE] {
                if self.castling_rook(color, side).is_some() {
                    key ^= ZOBRIST.castling(color, side);
                }
            }
        }
        key
    }

    /// Key recomputed from scratch
    pub(crate) fn compute_key(&self) -> u64 {
        let z = &*ZOBRIST;
        let mut key = self.pieces().fold(0, |k, (sq, p)| k ^ z.psq(p, sq));
        key ^= self.castling_key();
        if let Some(ep) = self.ep_square {
            key ^= z.ep_file(ep.file());
        }
        if self.side_to_move == Color::Black {
            key ^= z.side();
        }
        key
    }

    /// Colour-mirrored position: ranks flipped, colours swapped.
    /// The evaluation of the result equals the evaluation of `self`.
    pub fn flipped(&self) -> Position {
        let mut f = Position::empty(self.chess960);
        for (sq, p) in self.pieces() {
            f.board[sq.flip_rank().index()] = Some(Piece::new(!p.color, p.kind));
        }
        for color in Color::ALL {
            f.king_square[(!color).index()] = self.king_square(color).flip_rank();
            for side in [KING_SIDE, QUEEN_SIDE] {
                f.castling_rooks[(!color).index()][side] =
                    self.castling_rook(color, side).map(Square::flip_rank);
            }
        }
        f.side_to_move = !self.side_to_move;
        f.ep_square = self.ep_square.map(Square::flip_rank);
        f.rule50 = self.rule50;
        let fullmove = self.fullmove_number();
        let black = u32::from(f.side_to_move == Color::Black);
        f.game_ply = fullmove.saturating_sub(1).saturating_mul(2) + black;
        f.key = f.compute_key();
        f
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n +---+---+---+---+---+---+---+---+")?;
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = self.piece_on(Square::new(file, rank)).map_or(' ', Piece::to_char);
                write!(f, " | {c}")?;
            }
            writeln!(f, " | {}\n +---+---+---+---+---+---+---+---+", rank + 1)?;
        }
        writeln!(f, "   a   b   c   d   e   f   g   h\n")?;
        writeln!(f, "Fen: {}", self.to_fen())?;
        writeln!(f, "Key: {:016X}", self.key)?;
        write!(f, "Checkers:")?;
        for sq in self.checkers() {
            write!(f, " {sq}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_startpos_basics() {
        let pos = Position::startpos();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.king_square(Color::White), Square::E1);
        assert_eq!(pos.king_square(Color::Black), Square::E8);
        assert!(!pos.in_check());
        assert_eq!(pos.key(), pos.compute_key());
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn test_play_double_push_sets_ep_only_when_capturable() {
        let pos = Position::startpos().play(Move::normal(sq("e2"), sq("e4")));
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.side_to_move(), Color::Black);

        let pos = Position::from_fen("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1", false).unwrap();
        let pos = pos.play(Move::normal(sq("e2"), sq("e4")));
        assert_eq!(pos.ep_square(), Some(sq("e3")));
        assert_eq!(pos.key(), pos.compute_key());
    }

    #[test]
    fn test_incremental_key_matches_full_recompute() {
        let mut pos = Position::startpos();
        let moves = [
            ("g1", "f3"),
            ("g8", "f6"),
            ("e2", "e4"),
            ("f6", "e4"),
            ("f1", "c4"),
            ("d7", "d5"),
        ];
        for (f, t) in moves {
            pos = pos.play(Move::normal(sq(f), sq(t)));
            assert_eq!(pos.key(), pos.compute_key());
        }
        let castle = Move::new(Square::E1, Square::H1, MoveKind::Castling);
        pos = pos.play(castle);
        assert_eq!(pos.key(), pos.compute_key());
        assert_eq!(pos.piece_on(Square::G1), Some(Piece::new(Color::White, PieceType::King)));
        assert_eq!(pos.piece_on(Square::F1), Some(Piece::new(Color::White, PieceType::Rook)));
        assert_eq!(pos.castling_rook(Color::White, KING_SIDE), None);
    }

    #[test]
    fn test_en_passant_capture_removes_pawn() {
        let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2", false).unwrap();
        assert_eq!(pos.ep_square(), Some(sq("d6")));
        let next = pos.play(Move::new(sq("e5"), sq("d6"), MoveKind::EnPassant));
        assert_eq!(next.piece_on(sq("d5")), None);
        assert_eq!(next.state().captured, Some(Piece::new(Color::Black, PieceType::Pawn)));
        assert_eq!(next.rule50(), 0);
        assert_eq!(next.key(), next.compute_key());
    }

    #[test]
    fn test_capturing_rook_drops_castling_right() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", false).unwrap();
        let next = pos.play(Move::normal(sq("a1"), sq("a8")));
        assert_eq!(next.castling_rook(Color::Black, QUEEN_SIDE), None);
        assert_eq!(next.castling_rook(Color::Black, KING_SIDE), Some(Square::H8));
        assert_eq!(next.castling_rook(Color::White, QUEEN_SIDE), None);
        assert_eq!(next.key(), next.compute_key());
    }

    #[test]
    fn test_checkers_and_in_check() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1", false).unwrap();
        assert!(pos.in_check());
        assert_eq!(pos.checkers(), vec![sq("e2")]);

        let pos = Position::from_fen("4k3/8/8/8/8/4p3/8/4K3 w - - 0 1", false).unwrap();
        assert!(!pos.in_check());
    }

    #[test]
    fn test_flipped_mirrors_board_and_side() {
        let pos = Position::startpos().play(Move::normal(sq("e2"), sq("e4")));
        let flipped = pos.flipped();
        assert_eq!(flipped.side_to_move(), Color::White);
        assert_eq!(flipped.piece_on(sq("e5")), Some(Piece::new(Color::Black, PieceType::Pawn)));
        assert_eq!(flipped.key(), flipped.compute_key());
        assert_eq!(flipped.flipped().to_fen(), pos.to_fen());
    }

    #[test]
    fn test_display_contains_fen_key_and_checkers() {
        let text = Position::startpos().to_string();
        assert!(text.contains(&format!("Fen: {START_FEN}")));
        assert!(text.contains("Key: "));
        assert!(text.contains("Checkers:"));
    }
}
