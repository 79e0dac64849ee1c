//! Basic chess types

mod color;
mod moves;
mod piece;
mod square;
mod value;

pub use color::Color;
pub use moves::{Move, MoveKind};
pub use piece::{Piece, PieceType};
pub use square::Square;
pub use value::{Bound, Value, MAX_PLY};
