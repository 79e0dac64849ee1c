//! rhoney-core: chess engine core
//!
//! The protocol front-end (`rhoney-uci`) only talks to this crate through a
//! narrow contract:
//!
//! - legal move enumeration (`Position::legal_moves`)
//! - applying a move to get a new snapshot (`Position::play`, `StateInfo`)
//! - start / stop / ponderhit / wait for a search (`search::SearchPool`)
//! - nodes searched and cache clearing (`SearchPool::nodes_searched`, `SearchPool::clear`)
//! - static evaluation trace (`eval::trace`)
//! - build identification (`misc::compiler_info`)

pub mod eval;
pub mod misc;
pub mod movegen;
pub mod position;
pub mod search;
pub mod tt;
pub mod types;

pub use movegen::{perft, MoveList};
pub use position::{FenError, Position, StateHistory, StateInfo, START_FEN};
pub use types::{Color, Move, MoveKind, Piece, PieceType, Square, Value};
