//! Protocol-level errors
//!
//! None of these end the session: the dispatcher reports them on the output
//! stream or in the log and carries on with the next line.

use rhoney_core::FenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UciError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("No such option: {0}")]
    NoSuchOption(String),

    #[error("invalid value '{value}' for option {name}")]
    InvalidOptionValue { name: String, value: String },

    #[error("invalid FEN: {0}")]
    InvalidFen(#[from] FenError),

    #[error("invalid number '{token}' after '{keyword}'")]
    InvalidNumber { keyword: String, token: String },

    #[error("unable to open file {path}: {source}")]
    BenchFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, UciError>;
