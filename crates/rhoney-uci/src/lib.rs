//! rhoney-uci: UCI protocol front-end for the rhoney chess engine
//!
//! Input lines are parsed into `Command`s (`parser`, with short aliases from
//! `alias`) and run against a `Session` by the `Uci` dispatcher. Search output
//! comes back through `reporter::UciReporter`, formatted by `notation` and
//! `score`.

pub mod alias;
pub mod bench;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod io;
pub mod notation;
pub mod options;
pub mod parser;
pub mod reporter;
pub mod score;
pub mod session;

pub use commands::{Command, GoParams, PositionStart};
pub use dispatch::{Flow, Uci};
pub use error::{Result, UciError};
pub use io::SyncOut;
pub use parser::parse_command;
pub use session::Session;
