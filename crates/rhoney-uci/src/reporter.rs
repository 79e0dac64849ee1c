//! `SearchReporter` writing UCI `info` / `bestmove` lines

use std::sync::{Mutex, PoisonError};

use rhoney_core::search::{IterationInfo, SearchReporter};
use rhoney_core::Move;

use crate::io::SyncOut;
use crate::notation;
use crate::score::{format_value, ScoreOutput};

pub struct UciReporter {
    out: SyncOut,
    score: ScoreOutput,
    chess960: bool,
    /// Keep only the newest info line and print it right before `bestmove`
    min_output: bool,
    pending: Mutex<Option<String>>,
}

impl UciReporter {
    pub fn new(out: SyncOut, score: ScoreOutput, chess960: bool, min_output: bool) -> Self {
        Self {
            out,
            score,
            chess960,
            min_output,
            pending: Mutex::new(None),
        }
    }

    pub fn info_line(&self, info: &IterationInfo) -> String {
        let mut line = format!(
            "info depth {} seldepth {} multipv {} score {} nodes {} nps {} hashfull {} time {}",
            info.depth,
            info.seldepth,
            info.multipv,
            format_value(info.score, self.score),
            info.nodes,
            info.nps,
            info.hashfull,
            info.time_ms,
        );
        if !info.pv.is_empty() {
            line.push_str(" pv");
            for &m in &info.pv {
                line.push(' ');
                line.push_str(&notation::encode(m, self.chess960));
            }
        }
        line
    }
}

impl SearchReporter for UciReporter {
    fn on_iteration(&self, info: &IterationInfo) {
        let line = self.info_line(info);
        if self.min_output {
            *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(line);
        } else {
            self.out.println(&line);
        }
    }

    fn on_best_move(&self, best: Option<Move>, ponder: Option<Move>) {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(line) = pending {
            self.out.println(&line);
        }

        let mut line = format!("bestmove {}", notation::encode_opt(best, self.chess960));
        if let (Some(_), Some(p)) = (best, ponder) {
            line.push_str(" ponder ");
            line.push_str(&notation::encode(p, self.chess960));
        }
        self.out.println(&line);
    }

    fn on_perft_divide(&self, mv: Move, nodes: u64) {
        self.out.println(&format!("{}: {nodes}", notation::encode(mv, self.chess960)));
    }

    fn on_perft_total(&self, nodes: u64) {
        self.out.println(&format!("\nNodes searched: {nodes}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhoney_core::{Square, Value};

    fn e2e4() -> Move {
        Move::normal(Square::parse("e2").unwrap(), Square::parse("e4").unwrap())
    }

    fn e7e5() -> Move {
        Move::normal(Square::parse("e7").unwrap(), Square::parse("e5").unwrap())
    }

    fn info(depth: i32) -> IterationInfo {
        IterationInfo {
            depth,
            seldepth: depth + 2,
            multipv: 1,
            score: Value::new(100),
            nodes: 1234,
            nps: 5678,
            hashfull: 3,
            time_ms: 217,
            pv: vec![e2e4(), e7e5()],
        }
    }

    #[test]
    fn test_info_line_layout() {
        let (out, stdout, _) = SyncOut::capture();
        let reporter = UciReporter::new(out, ScoreOutput::Centipawn, false, false);
        reporter.on_iteration(&info(5));
        assert_eq!(
            stdout.lines(),
            vec![
                "info depth 5 seldepth 7 multipv 1 score cp 31 nodes 1234 nps 5678 hashfull 3 \
                 time 217 pv e2e4 e7e5"
            ]
        );
    }

    #[test]
    fn test_min_output_keeps_only_last_info() {
        let (out, stdout, _) = SyncOut::capture();
        let reporter = UciReporter::new(out, ScoreOutput::Percent, false, true);
        reporter.on_iteration(&info(1));
        reporter.on_iteration(&info(2));
        assert!(stdout.lines().is_empty());

        reporter.on_best_move(Some(e2e4()), Some(e7e5()));
        let lines = stdout.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("info depth 2 "));
        assert_eq!(lines[1], "bestmove e2e4 ponder e7e5");
    }

    #[test]
    fn test_best_move_without_legal_moves() {
        let (out, stdout, _) = SyncOut::capture();
        let reporter = UciReporter::new(out, ScoreOutput::Centipawn, false, false);
        reporter.on_best_move(None, None);
        assert_eq!(stdout.lines(), vec!["bestmove (none)"]);
    }

    #[test]
    fn test_perft_lines() {
        let (out, stdout, _) = SyncOut::capture();
        let reporter = UciReporter::new(out, ScoreOutput::Centipawn, false, false);
        reporter.on_perft_divide(e2e4(), 20);
        reporter.on_perft_total(400);
        assert_eq!(stdout.lines(), vec!["e2e4: 20", "", "Nodes searched: 400", ""]);
    }
}
