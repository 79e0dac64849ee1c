//! UCI command definitions

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank line, or a line with nothing to act on
    Empty,

    Uci,
    IsReady,
    UciNewGame,
    Quit,
    Stop,
    PonderHit,

    /// `setoption name <name...> value <value...>`
    SetOption { name: String, value: String },

    /// `set <option-or-alias> <value...>`
    Set { name: String, value: String },

    Position { start: PositionStart, moves: Vec<String> },

    Go(GoParams),

    /// `d`: print the board
    Display,
    Flip,
    Eval,
    Compiler,

    /// `bench [hash] [threads] [limit] [fenFile] [limitType]`
    Bench(Vec<String>),

    /// Anything else; carries the whole line
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionStart {
    StartPos,
    Fen(String),
}

/// Fields of a `go` command, times in milliseconds.
///
/// Move texts after `searchmoves` are kept as text; they can only be decoded
/// against the session position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: i64,
    pub btime: i64,
    pub winc: i64,
    pub binc: i64,
    pub movestogo: u32,
    pub depth: i32,
    pub nodes: u64,
    pub movetime: i64,
    pub mate: i32,
    pub perft: i32,
    pub infinite: bool,
    pub ponder: bool,
    pub searchmoves: Vec<String>,
}
