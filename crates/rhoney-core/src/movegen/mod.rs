//! Move generation
//!
//! Pseudo-legal generation over the mailbox board, filtered to legal moves by
//! playing each candidate and testing the mover's king. Castling follows the
//! generic Chess960 rule, which also covers standard chess.

use smallvec::SmallVec;

use crate::position::{
    DIAGONALS, KING_SIDE, KING_STEPS, KNIGHT_STEPS, ORTHOGONALS, Position, QUEEN_SIDE,
};
use crate::types::{Move, MoveKind, PieceType, Square};

/// Move buffer; 64 inline slots cover nearly every real position
pub type MoveList = SmallVec<[Move; 64]>;

impl Position {
    /// All legal moves for the side to move
    pub fn legal_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        generate_pseudo(self, false, &mut list);
        list.retain(|m| !self.play(*m).left_king_in_check());
        list
    }

    /// Is `m` one of the legal moves of this position?
    pub fn is_legal(&self, m: Move) -> bool {
        self.legal_moves().contains(&m)
    }
}

/// Pseudo-legal moves: own-king safety is not checked except for castling.
///
/// With `captures_only`, only captures and promotions are produced.
pub fn generate_pseudo(pos: &Position, captures_only: bool, list: &mut MoveList) {
    let us = pos.side_to_move();

    for (from, piece) in pos.pieces() {
        if piece.color != us {
            continue;
        }
        match piece.kind {
            PieceType::Pawn => pawn_moves(pos, from, captures_only, list),
            PieceType::Knight => step_moves(pos, from, &KNIGHT_STEPS, captures_only, list),
            PieceType::King => step_moves(pos, from, &KING_STEPS, captures_only, list),
            PieceType::Bishop => slider_moves(pos, from, &DIAGONALS, captures_only, list),
            PieceType::Rook => slider_moves(pos, from, &ORTHOGONALS, captures_only, list),
            PieceType::Queen => {
                slider_moves(pos, from, &DIAGONALS, captures_only, list);
                slider_moves(pos, from, &ORTHOGONALS, captures_only, list);
            }
        }
    }

    if !captures_only {
        castling_moves(pos, list);
    }
}

fn pawn_moves(pos: &Position, from: Square, captures_only: bool, list: &mut MoveList) {
    let us = pos.side_to_move();
    let fwd = us.forward();
    let promo_rank = if fwd > 0 { 7 } else { 0 };
    let start_rank = if fwd > 0 { 1 } else { 6 };

    let push = |to: Square, list: &mut MoveList| {
        if to.rank() == promo_rank {
            for pt in PieceType::PROMOTIONS {
                list.push(Move::new(from, to, MoveKind::Promotion(pt)));
            }
        } else {
            list.push(Move::normal(from, to));
        }
    };

    if let Some(one) = from.offset(0, fwd).filter(|&sq| pos.piece_on(sq).is_none()) {
        if !captures_only || one.rank() == promo_rank {
            push(one, list);
        }
        if !captures_only && from.rank() == start_rank {
            if let Some(two) = one.offset(0, fwd).filter(|&sq| pos.piece_on(sq).is_none()) {
                list.push(Move::normal(from, two));
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(df, fwd) else { continue };
        match pos.piece_on(to) {
            Some(p) if p.color != us => push(to, list),
            None if pos.ep_square() == Some(to) => {
                list.push(Move::new(from, to, MoveKind::EnPassant));
            }
            _ => {}
        }
    }
}

fn step_moves(
    pos: &Position,
    from: Square,
    steps: &[(i8, i8)],
    captures_only: bool,
    list: &mut MoveList,
) {
    let us = pos.side_to_move();
    for &(df, dr) in steps {
        let Some(to) = from.offset(df, dr) else { continue };
        match pos.piece_on(to) {
            Some(p) if p.color == us => {}
            Some(_) => list.push(Move::normal(from, to)),
            None if !captures_only => list.push(Move::normal(from, to)),
            None => {}
        }
    }
}

fn slider_moves(
    pos: &Position,
    from: Square,
    dirs: &[(i8, i8)],
    captures_only: bool,
    list: &mut MoveList,
) {
    let us = pos.side_to_move();
    for &(df, dr) in dirs {
        let mut cur = from;
        while let Some(to) = cur.offset(df, dr) {
            match pos.piece_on(to) {
                Some(p) => {
                    if p.color != us {
                        list.push(Move::normal(from, to));
                    }
                    break;
                }
                None => {
                    if !captures_only {
                        list.push(Move::normal(from, to));
                    }
                }
            }
            cur = to;
        }
    }
}

/// Castling: every square the king and rook cross or land on must be empty
/// (ignoring the two castling pieces), and no square the king stands on or
/// crosses may be attacked.
fn castling_moves(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let ksq = pos.king_square(us);
    if pos.in_check() {
        return;
    }

    for side in [KING_SIDE, QUEEN_SIDE] {
        let Some(rsq) = pos.castling_rook(us, side) else { continue };
        let king_to = ksq.with_file(if side == KING_SIDE { 6 } else { 2 });
        let rook_to = ksq.with_file(if side == KING_SIDE { 5 } else { 3 });

        let lo = ksq.file().min(rsq.file()).min(king_to.file()).min(rook_to.file());
        let hi = ksq.file().max(rsq.file()).max(king_to.file()).max(rook_to.file());
        let blocked = (lo..=hi)
            .map(|f| ksq.with_file(f))
            .filter(|&sq| sq != ksq && sq != rsq)
            .any(|sq| pos.piece_on(sq).is_some());
        if blocked {
            continue;
        }

        let (k_lo, k_hi) = (ksq.file().min(king_to.file()), ksq.file().max(king_to.file()));
        let attacked = (k_lo..=k_hi)
            .map(|f| ksq.with_file(f))
            .any(|sq| pos.is_attacked(sq, !us));
        if attacked {
            continue;
        }

        // The rook may have been shielding the king along the back rank (960)
        let m = Move::new(ksq, rsq, MoveKind::Castling);
        if !pos.play(m).left_king_in_check() {
            list.push(m);
        }
    }
}

/// Count leaf nodes of the legal move tree to `depth`
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = pos.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves.iter().map(|&m| perft(&pos.play(m), depth - 1)).sum()
}

/// Per-root-move leaf counts, in generation order
pub fn perft_divide(pos: &Position, depth: u32) -> Vec<(Move, u64)> {
    let depth = depth.max(1);
    pos.legal_moves()
        .iter()
        .map(|&m| (m, perft(&pos.play(m), depth - 1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_perft_startpos() {
        let pos = Position::from_fen(START_FEN, false).unwrap();
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        let pos = Position::from_fen(KIWIPETE, false).unwrap();
        assert_eq!(perft(&pos, 1), 48);
        assert_eq!(perft(&pos, 2), 2039);
    }

    #[test]
    fn test_perft_en_passant_and_promotion_position() {
        // "Position 3" of the common perft suite
        let pos = Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", false).unwrap();
        assert_eq!(perft(&pos, 1), 14);
        assert_eq!(perft(&pos, 2), 191);
        assert_eq!(perft(&pos, 3), 2812);
    }

    #[test]
    fn test_divide_sums_to_perft() {
        let pos = Position::startpos();
        let divide = perft_divide(&pos, 2);
        assert_eq!(divide.len(), 20);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 400);
    }

    #[test]
    fn test_castling_both_sides_generated() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", false).unwrap();
        let castles: Vec<_> = pos.legal_moves().into_iter().filter(|m| m.is_castling()).collect();
        assert_eq!(castles.len(), 2);
        assert!(castles.contains(&Move::new(Square::E1, Square::H1, MoveKind::Castling)));
        assert!(castles.contains(&Move::new(Square::E1, Square::A1, MoveKind::Castling)));
    }

    #[test]
    fn test_castling_through_attack_is_illegal() {
        // Black rook on f8 covers f1
        let pos = Position::from_fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1", false).unwrap();
        assert!(!pos.legal_moves().iter().any(|m| m.is_castling()));
    }

    #[test]
    fn test_chess960_castling_with_adjacent_rook() {
        // King b1, rook a1: queen side castling lands king c1, rook d1
        let pos = Position::from_fen("1k6/8/8/8/8/8/8/RK6 w A - 0 1", true).unwrap();
        let castle = Move::new(Square::parse("b1").unwrap(), Square::A1, MoveKind::Castling);
        assert!(pos.is_legal(castle));
        let next = pos.play(castle);
        assert_eq!(next.piece_on(Square::C1).map(|p| p.kind), Some(PieceType::King));
        assert_eq!(next.piece_on(Square::D1).map(|p| p.kind), Some(PieceType::Rook));
        assert_eq!(next.key(), next.compute_key());
    }

    #[test]
    fn test_promotions_expand_to_four_moves() {
        let pos = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1", false).unwrap();
        let promos = pos.legal_moves().into_iter().filter(|m| m.promotion().is_some()).count();
        assert_eq!(promos, 4);
    }

    #[test]
    fn test_checkmate_has_no_moves() {
        // Fool's mate
        let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
        let pos = Position::from_fen(fen, false).unwrap();
        assert!(pos.in_check());
        assert!(pos.legal_moves().is_empty());
    }
}
