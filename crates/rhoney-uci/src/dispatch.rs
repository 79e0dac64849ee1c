//! Read-dispatch loop
//!
//! One line at a time: parse it, run the handler, write the response. The
//! only state carried between lines is the `Session`.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rhoney_core::search::SearchLimits;
use rhoney_core::{eval, misc, Color, Move};

use crate::alias;
use crate::bench;
use crate::commands::{Command, GoParams};
use crate::error::UciError;
use crate::io::SyncOut;
use crate::notation;
use crate::options;
use crate::parser::parse_command;
use crate::reporter::UciReporter;
use crate::session::Session;

/// Whether the read loop goes on after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Uci {
    session: Session,
    out: SyncOut,
}

impl Uci {
    pub fn new(out: SyncOut) -> Self {
        Self {
            session: Session::new(),
            out,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn out(&self) -> &SyncOut {
        &self.out
    }

    /// Interactive mode: read until `quit` or end of input, which counts as
    /// `quit`. A search still running is stopped and awaited before returning.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            let line = match lines.next() {
                Some(line) => line?,
                None => {
                    debug!("end of input");
                    "quit".to_string()
                }
            };
            if self.execute(&line) == Flow::Quit {
                break;
            }
        }
        self.session.wait_for_search_finished();
        Ok(())
    }

    /// One-shot mode: run a single pre-supplied command, then let any search
    /// it started run to completion.
    pub fn run_once(&mut self, line: &str) {
        self.execute(line);
        self.session.wait_for_search_finished();
    }

    pub fn execute(&mut self, line: &str) -> Flow {
        let command = parse_command(line);
        debug!("command: {command:?}");
        self.dispatch(command)
    }

    pub(crate) fn dispatch(&mut self, command: Command) -> Flow {
        match command {
            Command::Empty => {}
            Command::Quit => {
                self.session.stop();
                return Flow::Quit;
            }
            Command::Stop => self.session.stop(),
            Command::PonderHit => self.session.ponderhit(),
            Command::Uci => self.out.println(&format!(
                "id name {}\n{}\nuciok",
                misc::engine_info(true),
                self.session.options()
            )),
            Command::IsReady => self.out.println("readyok"),
            Command::UciNewGame => self.session.new_game(),
            Command::SetOption { name, value } => self.setoption(&name, &value),
            Command::Set { name, value } => self.set(&name, &value),
            Command::Position { start, moves } => {
                if let Err(e) = self.session.apply_position(&start, &moves) {
                    warn!("position: {e}");
                    self.out.info_string(e.to_string());
                }
            }
            Command::Go(params) => self.go(params),
            Command::Display => self.out.println(&self.session.position().to_string()),
            Command::Flip => self.session.flip(),
            Command::Eval => self.out.println(&eval::trace(self.session.position())),
            Command::Compiler => self.out.println(&misc::compiler_info()),
            Command::Bench(args) => bench::run(self, &args),
            Command::Unknown(line) => self.out.println(&UciError::UnknownCommand(line).to_string()),
        }
        Flow::Continue
    }

    fn setoption(&mut self, name: &str, value: &str) {
        match self.session.set_option(name, value) {
            Ok(()) => {}
            Err(e @ UciError::NoSuchOption(_)) => self.out.println(&e.to_string()),
            Err(e) => warn!("setoption: {e}"),
        }
    }

    /// `set` shortcut: option name or alias, then the value
    fn set(&mut self, name: &str, value: &str) {
        if name.is_empty() || name == "option" {
            self.out.println(&alias::help_lines().join("\n"));
            return;
        }

        let canonical = alias::option_name(name);
        match self.session.set_option(canonical, value) {
            Ok(()) => {
                let unit = if canonical == options::HASH { " Mb" } else { "" };
                self.out
                    .println(&format!("Confirmation: {canonical} set to {value}{unit}"));
            }
            Err(UciError::NoSuchOption(_)) => {
                self.out.println(&UciError::NoSuchOption(name.to_string()).to_string())
            }
            Err(e) => warn!("set: {e}"),
        }
    }

    /// Start a search on the current position. Returns at once; the search
    /// reports through a `UciReporter`.
    pub(crate) fn go(&mut self, params: GoParams) {
        let start_time = Instant::now();
        let position = self.session.position();

        let searchmoves: Vec<Move> = params
            .searchmoves
            .iter()
            .filter_map(|text| {
                let m = notation::decode(position, text);
                if m.is_none() {
                    debug!("searchmoves: dropping '{text}'");
                }
                m
            })
            .collect();

        let mut time = [0; Color::NUM];
        let mut inc = [0; Color::NUM];
        time[Color::White.index()] = params.wtime;
        time[Color::Black.index()] = params.btime;
        inc[Color::White.index()] = params.winc;
        inc[Color::Black.index()] = params.binc;

        let limits = SearchLimits {
            time,
            inc,
            movestogo: params.movestogo,
            depth: params.depth,
            nodes: params.nodes,
            movetime: params.movetime,
            mate: params.mate,
            perft: params.perft,
            infinite: params.infinite,
            searchmoves,
            start_time,
        };

        let table = self.session.options();
        let reporter = Arc::new(UciReporter::new(
            self.out.clone(),
            table.score_output(),
            self.session.chess960(),
            table.get_bool(options::MIN_OUTPUT),
        ));
        self.session.start_search(limits, params.ponder, reporter);
    }
}
