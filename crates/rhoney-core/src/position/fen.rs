//! FEN parsing and output
//!
//! Accepts standard FEN, X-FEN (`KQkq` meaning the outermost rook) and
//! Shredder-FEN (rook file letters). Trailing fields may be omitted.

use thiserror::Error;

use super::{KING_SIDE, Position, QUEEN_SIDE};
use crate::types::{Color, Piece, PieceType, Square};

/// FEN of the standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("empty FEN")]
    MissingBoard,

    #[error("invalid board field: {0}")]
    InvalidBoard(String),

    #[error("invalid side to move: {0}")]
    InvalidSideToMove(String),

    #[error("invalid castling field: {0}")]
    InvalidCastling(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassant(String),

    #[error("invalid move counter: {0}")]
    InvalidCounter(String),

    #[error("each side needs exactly one king")]
    KingCount,
}

impl Position {
    /// Parse a FEN string.
    ///
    /// `chess960` only affects how castling rights are written back out
    /// and how castling moves are printed; parsing accepts both styles.
    pub fn from_fen(fen: &str, chess960: bool) -> Result<Position, FenError> {
        let mut fields = fen.split_whitespace();
        let board = fields.next().ok_or(FenError::MissingBoard)?;

        let mut pos = Position::empty(chess960);
        pos.parse_board(board)?;

        pos.side_to_move = match fields.next() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => return Err(FenError::InvalidSideToMove(other.to_string())),
        };

        if let Some(castling) = fields.next() {
            pos.parse_castling(castling)?;
        }

        if let Some(ep) = fields.next() {
            pos.parse_en_passant(ep)?;
        }

        let rule50 = parse_counter(fields.next(), 0)?;
        let fullmove = parse_counter(fields.next(), 1)?.max(1);
        pos.rule50 = rule50;
        pos.game_ply = 2 * (fullmove - 1) + u32::from(pos.side_to_move == Color::Black);

        pos.key = pos.compute_key();
        Ok(pos)
    }

    fn parse_board(&mut self, board: &str) -> Result<(), FenError> {
        let invalid = || FenError::InvalidBoard(board.to_string());
        let ranks: Vec<&str> = board.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid());
        }

        let mut kings = [0u32; Color::NUM];
        for (i, row) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid());
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_char(c).ok_or_else(invalid)?;
                    if file >= 8 {
                        return Err(invalid());
                    }
                    let sq = Square::new(file, rank);
                    self.board[sq.index()] = Some(piece);
                    if piece.kind == PieceType::King {
                        kings[piece.color.index()] += 1;
                        self.king_square[piece.color.index()] = sq;
                    }
                    file += 1;
                }
                if file > 8 {
                    return Err(invalid());
                }
            }
            if file != 8 {
                return Err(invalid());
            }
        }

        if kings != [1, 1] {
            return Err(FenError::KingCount);
        }
        Ok(())
    }

    fn parse_castling(&mut self, field: &str) -> Result<(), FenError> {
        if field == "-" {
            return Ok(());
        }
        let invalid = || FenError::InvalidCastling(field.to_string());

        for c in field.chars() {
            let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
            let back_rank = if color == Color::White { 0 } else { 7 };
            let ksq = self.king_square(color);
            if ksq.rank() != back_rank {
                return Err(invalid());
            }
            let rook = Some(Piece::new(color, PieceType::Rook));

            let rook_sq = match c.to_ascii_lowercase() {
                'k' => (ksq.file() + 1..8)
                    .rev()
                    .map(|f| Square::new(f, back_rank))
                    .find(|&sq| self.piece_on(sq) == rook),
                'q' => (0..ksq.file())
                    .map(|f| Square::new(f, back_rank))
                    .find(|&sq| self.piece_on(sq) == rook),
                f @ 'a'..='h' => {
                    let sq = Square::new(f as u8 - b'a', back_rank);
                    (self.piece_on(sq) == rook).then_some(sq)
                }
                _ => return Err(invalid()),
            };

            // Rights without a matching rook are dropped rather than rejected
            let Some(rook_sq) = rook_sq else { continue };
            let side = if rook_sq.file() > ksq.file() { KING_SIDE } else { QUEEN_SIDE };
            self.castling_rooks[color.index()][side] = Some(rook_sq);
        }
        Ok(())
    }

    fn parse_en_passant(&mut self, field: &str) -> Result<(), FenError> {
        if field == "-" {
            return Ok(());
        }
        let sq = Square::parse(field).ok_or_else(|| FenError::InvalidEnPassant(field.to_string()))?;

        let us = self.side_to_move;
        let expected_rank = if us == Color::White { 5 } else { 2 };
        let pushed = sq.offset(0, -us.forward());
        let our_pawn = Some(Piece::new(us, PieceType::Pawn));
        let capturable = sq.rank() == expected_rank
            && self.piece_on(sq).is_none()
            && pushed.and_then(|s| self.piece_on(s)) == Some(Piece::new(!us, PieceType::Pawn))
            && [sq.offset(-1, -us.forward()), sq.offset(1, -us.forward())]
                .into_iter()
                .flatten()
                .any(|s| self.piece_on(s) == our_pawn);

        if capturable {
            self.ep_square = Some(sq);
        }
        Ok(())
    }

    /// FEN of the position. Castling rights use file letters in Chess960 mode.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_on(Square::new(file, rank)) {
                    Some(p) => {
                        if empty > 0 {
                            fen.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        fen.push(p.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.side_to_move.to_char());
        fen.push(' ');

        let mut any_castling = false;
        for color in Color::ALL {
            for side in [KING_SIDE, QUEEN_SIDE] {
                let Some(rook_sq) = self.castling_rook(color, side) else {
                    continue;
                };
                let c = if self.chess960 {
                    char::from(b'a' + rook_sq.file())
                } else if side == KING_SIDE {
                    'k'
                } else {
                    'q'
                };
                fen.push(if color == Color::White { c.to_ascii_uppercase() } else { c });
                any_castling = true;
            }
        }
        if !any_castling {
            fen.push('-');
        }

        match self.ep_square {
            Some(sq) => fen.push_str(&format!(" {sq}")),
            None => fen.push_str(" -"),
        }
        fen.push_str(&format!(" {} {}", self.rule50, self.fullmove_number()));
        fen
    }
}

/// Largest half-move or full-move counter accepted
const MAX_COUNTER: u32 = u16::MAX as u32;

fn parse_counter(field: Option<&str>, default: u32) -> Result<u32, FenError> {
    let Some(s) = field else {
        return Ok(default);
    };
    s.parse()
        .ok()
        .filter(|&n| n <= MAX_COUNTER)
        .ok_or_else(|| FenError::InvalidCounter(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_fen_round_trip() {
        let pos = Position::from_fen(START_FEN, false).unwrap();
        assert_eq!(pos.to_fen(), START_FEN);
    }

    #[test]
    fn test_missing_trailing_fields_use_defaults() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3", false).unwrap();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_black_to_move_counters() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let pos = Position::from_fen(fen, false).unwrap();
        assert_eq!(pos.game_ply(), 1);
        assert_eq!(pos.fullmove_number(), 1);
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_uncapturable_ep_square_is_dropped() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let pos = Position::from_fen(fen, false).unwrap();
        assert_eq!(pos.ep_square(), None);
    }

    #[test]
    fn test_shredder_castling_in_chess960() {
        let fen = "bqnb1rkr/pp3ppp/3ppn2/2p5/5P2/P2P4/NPP1P1PP/BQ1BNRKR w HFhf - 2 9";
        let pos = Position::from_fen(fen, true).unwrap();
        assert_eq!(pos.castling_rook(Color::White, KING_SIDE), Square::parse("h1"));
        assert_eq!(pos.castling_rook(Color::White, QUEEN_SIDE), Square::parse("f1"));
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_out_of_range_counters_are_rejected() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 4294967295",
            "4k3/8/8/8/8/8/8/4K3 w - - 4294967295 1",
            "4k3/8/8/8/8/8/8/4K3 b - - 0 65536",
        ] {
            assert!(
                matches!(Position::from_fen(fen, false), Err(FenError::InvalidCounter(_))),
                "{fen}"
            );
        }

        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 65535 65535", false).unwrap();
        assert_eq!(pos.fullmove_number(), 65535);
        assert_eq!(pos.flipped().flipped().to_fen(), pos.to_fen());
    }

    #[test]
    fn test_invalid_fens_are_rejected() {
        assert_eq!(Position::from_fen("", false).unwrap_err(), FenError::MissingBoard);
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1", false),
            Err(FenError::KingCount)
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1", false),
            Err(FenError::InvalidSideToMove(_))
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/9/8/8/8/4K3 w - - 0 1", false),
            Err(FenError::InvalidBoard(_))
        ));
        assert!(matches!(
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1", false),
            Err(FenError::InvalidCounter(_))
        ));
    }
}
