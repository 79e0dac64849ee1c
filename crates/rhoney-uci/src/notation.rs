//! Coordinate move notation (`e2e4`, `e7e8q`, `e1g1`)
//!
//! Castling is kept internally as "king takes own rook". In standard chess it
//! is written with the king's landing square; in Chess960 mode the rook's
//! square is written as is.

use rhoney_core::{Move, Position};

/// Text for "no move", used by `bestmove` when there is nothing to play
pub const NO_MOVE: &str = "(none)";

/// Move to coordinate text
pub fn encode(m: Move, chess960: bool) -> String {
    let from = m.from();
    let mut to = m.to();

    if m.is_castling() && !chess960 {
        let file = if to.file() > from.file() { 6 } else { 2 };
        to = from.with_file(file);
    }

    let mut text = format!("{from}{to}");
    if let Some(pt) = m.promotion() {
        text.push(pt.to_char());
    }
    text
}

/// `encode` with `NO_MOVE` for an absent move
pub fn encode_opt(m: Option<Move>, chess960: bool) -> String {
    m.map_or_else(|| NO_MOVE.to_string(), |m| encode(m, chess960))
}

/// Coordinate text to a legal move of `pos`, `None` when nothing matches.
///
/// The promotion letter may be given in either case.
pub fn decode(pos: &Position, text: &str) -> Option<Move> {
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return None;
    }
    let (squares, promo) = text.split_at(4);
    let text = format!("{squares}{}", promo.to_ascii_lowercase());
    let chess960 = pos.is_chess960();
    pos.legal_moves().into_iter().find(|&m| encode(m, chess960) == text)
}
