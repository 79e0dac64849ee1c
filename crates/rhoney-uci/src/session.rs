//! Session state: current position, its history, options and the search pool

use std::sync::Arc;

use log::debug;
use rhoney_core::search::{SearchConfig, SearchLimits, SearchPool, SearchReporter};
use rhoney_core::{Position, StateHistory, START_FEN};

use crate::commands::PositionStart;
use crate::error::Result;
use crate::notation;
use crate::options::{self, OptionHook, OptionTable};

pub struct Session {
    position: Position,
    history: StateHistory,
    options: OptionTable,
    pool: SearchPool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let options = OptionTable::new();
        let pool = SearchPool::new(
            options.get_int(options::THREADS) as usize,
            options.get_int(options::HASH) as usize,
        );
        let position = Position::startpos();
        Self {
            history: StateHistory::new(&position),
            position,
            options,
            pool,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn options(&self) -> &OptionTable {
        &self.options
    }

    pub fn pool(&self) -> &SearchPool {
        &self.pool
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name)
    }

    pub fn chess960(&self) -> bool {
        self.options.get_bool(options::UCI_CHESS960)
    }

    /// Replace the position and its history.
    ///
    /// The new history is built aside and published in one step. Move replay
    /// stops silently at the first text that is not a legal move; an invalid
    /// FEN leaves the session untouched. Returns the number of moves played.
    pub fn apply_position(&mut self, start: &PositionStart, moves: &[String]) -> Result<usize> {
        let fen = match start {
            PositionStart::StartPos => START_FEN,
            PositionStart::Fen(fen) => fen.as_str(),
        };
        let mut position = Position::from_fen(fen, self.chess960())?;
        let mut history = StateHistory::new(&position);

        let mut played = 0;
        for text in moves {
            let Some(m) = notation::decode(&position, text) else {
                debug!("move replay stopped at '{text}'");
                break;
            };
            position = position.play(m);
            history.push(position.state());
            played += 1;
        }

        self.position = position;
        self.history = history;

        if self.options.get_bool(options::CLEAN_SEARCH) {
            self.pool.clear();
        }
        Ok(played)
    }

    /// Mirror the position colour-wise; the history restarts from it
    pub fn flip(&mut self) {
        self.position = self.position.flipped();
        self.history = StateHistory::new(&self.position);
    }

    /// Write an option and apply its engine-side effect
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        match self.options.set(name, value)? {
            Some(OptionHook::SetThreads(n)) => self.pool.set_threads(n),
            Some(OptionHook::ResizeHash(mb)) => self.pool.resize_hash(mb),
            Some(OptionHook::ClearHash) => self.pool.clear(),
            None => {}
        }
        debug!("option {name} = {value}");
        Ok(())
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            multipv: self.options.get_int(options::MULTI_PV).max(1) as usize,
            move_overhead: self.options.get_int(options::MOVE_OVERHEAD),
        }
    }

    /// Forget everything learnt by previous searches
    pub fn new_game(&mut self) {
        self.pool.clear();
    }

    /// Hand a snapshot of the current position to the search pool
    pub fn start_search(
        &mut self,
        limits: SearchLimits,
        ponder: bool,
        reporter: Arc<dyn SearchReporter>,
    ) {
        let config = self.search_config();
        self.pool
            .start_thinking(&self.position, self.history.keys(), limits, config, ponder, reporter);
    }

    pub fn stop(&self) {
        self.pool.stop();
    }

    pub fn ponderhit(&self) {
        self.pool.ponderhit();
    }

    pub fn wait_for_search_finished(&self) {
        self.pool.wait_for_search_finished();
    }

    pub fn nodes_searched(&self) -> u64 {
        self.pool.nodes_searched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UciError;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_startpos_with_moves_then_reset() {
        let mut session = Session::new();
        let played = session
            .apply_position(&PositionStart::StartPos, &moves(&["e2e4", "e7e5"]))
            .unwrap();
        assert_eq!(played, 2);
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history().last().key, session.position().key());

        session.apply_position(&PositionStart::StartPos, &[]).unwrap();
        assert_eq!(session.position().to_fen(), START_FEN);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_replay_stops_at_first_illegal_move() {
        let mut session = Session::new();
        let played = session
            .apply_position(&PositionStart::StartPos, &moves(&["e2e4", "e2e4", "e7e5"]))
            .unwrap();
        assert_eq!(played, 1);
        assert_eq!(
            session.position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_invalid_fen_leaves_session_untouched() {
        let mut session = Session::new();
        session.apply_position(&PositionStart::StartPos, &moves(&["d2d4"])).unwrap();
        let before = session.position().to_fen();

        let err = session
            .apply_position(&PositionStart::Fen("not a fen".to_string()), &[])
            .unwrap_err();
        assert!(matches!(err, UciError::InvalidFen(_)));
        assert_eq!(session.position().to_fen(), before);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_out_of_range_move_counter_is_invalid_fen() {
        let mut session = Session::new();
        session.apply_position(&PositionStart::StartPos, &moves(&["e2e4"])).unwrap();
        let before = session.position().to_fen();

        let fen = "4k3/8/8/8/8/8/8/4K3 w - - 0 4294967295";
        let err = session
            .apply_position(&PositionStart::Fen(fen.to_string()), &[])
            .unwrap_err();
        assert!(matches!(err, UciError::InvalidFen(_)));
        assert_eq!(session.position().to_fen(), before);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_threads_and_hash_reach_the_pool() {
        let mut session = Session::new();
        session.set_option(options::THREADS, "4").unwrap();
        assert_eq!(session.pool().threads(), 4);

        session.set_option(options::HASH, "1").unwrap();
        let small = session.pool().hash_len();
        session.set_option(options::HASH, "2").unwrap();
        assert_eq!(session.pool().hash_len(), 2 * small);
    }

    #[test]
    fn test_set_option_known_and_unknown() {
        let mut session = Session::new();
        session.set_option(options::HASH, "64").unwrap();
        assert_eq!(session.option(options::HASH), Some("64"));

        assert!(matches!(session.set_option("Bogus", "1"), Err(UciError::NoSuchOption(_))));
        assert_eq!(session.option("Bogus"), None);
    }

    #[test]
    fn test_chess960_flag_follows_option() {
        let mut session = Session::new();
        assert!(!session.chess960());
        session.set_option(options::UCI_CHESS960, "true").unwrap();
        assert!(session.chess960());
        let fen = "bqnb1rkr/pp3ppp/3ppn2/2p5/5P2/P2P4/NPP1P1PP/BQ1BNRKR w HFhf - 2 9";
        session
            .apply_position(&PositionStart::Fen(fen.to_string()), &[])
            .unwrap();
        assert!(session.position().is_chess960());
    }

    #[test]
    fn test_flip_twice_restores_position() {
        let mut session = Session::new();
        session.apply_position(&PositionStart::StartPos, &moves(&["e2e4"])).unwrap();
        let before = session.position().to_fen();
        session.flip();
        assert_ne!(session.position().to_fen(), before);
        assert_eq!(session.history().len(), 1);
        session.flip();
        assert_eq!(session.position().to_fen(), before);
    }

    #[test]
    fn test_search_config_from_options() {
        let mut session = Session::new();
        session.set_option(options::MULTI_PV, "3").unwrap();
        session.set_option(options::MOVE_OVERHEAD, "100").unwrap();
        let config = session.search_config();
        assert_eq!(config.multipv, 3);
        assert_eq!(config.move_overhead, 100);
    }
}
