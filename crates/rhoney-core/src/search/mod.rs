//! Search subsystem
//!
//! - `SearchLimits`: parameters of one `go` command
//! - `SearchReporter`: callbacks through which results leave the search
//! - `SearchPool`: owns the transposition table and runs searches on
//!   background threads (lazy SMP)
//!
//! Cancellation is cooperative. `stop()` raises a flag the search threads
//! poll; the main search thread acknowledges completion over a channel, which
//! `wait_for_search_finished()` receives before joining it.

mod alpha_beta;
mod time;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub use time::TimeManager;

use crate::movegen::perft_divide;
use crate::position::Position;
use crate::tt::TranspositionTable;
use crate::types::{Color, MAX_PLY, Move, Value};
use alpha_beta::Worker;

/// Milliseconds
pub type TimePoint = i64;

const SEARCH_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Limits of one search, built fresh for each `go`
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Remaining clock time per colour
    pub time: [TimePoint; Color::NUM],
    /// Increment per move per colour
    pub inc: [TimePoint; Color::NUM],
    pub movestogo: u32,
    /// Fixed depth (0 = unlimited)
    pub depth: i32,
    /// Node budget (0 = unlimited)
    pub nodes: u64,
    /// Fixed time per move (0 = unused)
    pub movetime: TimePoint,
    /// Stop once a mate in this many moves is found (0 = unused)
    pub mate: i32,
    /// Run a perft divide to this depth instead of searching (0 = search)
    pub perft: i32,
    pub infinite: bool,
    /// Root move restriction; empty means all legal moves
    pub searchmoves: Vec<Move>,
    pub start_time: Instant,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            time: [0; Color::NUM],
            inc: [0; Color::NUM],
            movestogo: 0,
            depth: 0,
            nodes: 0,
            movetime: 0,
            mate: 0,
            perft: 0,
            infinite: false,
            searchmoves: Vec::new(),
            start_time: Instant::now(),
        }
    }
}

impl SearchLimits {
    /// True when the clock decides how long to think
    #[inline]
    pub fn use_time_management(&self) -> bool {
        self.mate == 0
            && self.movetime == 0
            && self.depth == 0
            && self.nodes == 0
            && self.perft == 0
            && !self.infinite
    }

    /// Milliseconds since the `go` command arrived
    pub fn elapsed(&self) -> TimePoint {
        self.start_time.elapsed().as_millis() as TimePoint
    }
}

/// Option-derived search settings
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub multipv: usize,
    pub move_overhead: TimePoint,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            multipv: 1,
            move_overhead: 30,
        }
    }
}

/// One principal variation of a finished iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationInfo {
    pub depth: i32,
    pub seldepth: i32,
    /// 1-based line number
    pub multipv: usize,
    pub score: Value,
    pub nodes: u64,
    pub nps: u64,
    /// Permille
    pub hashfull: u32,
    pub time_ms: TimePoint,
    pub pv: Vec<Move>,
}

/// Receives search output. Called from the main search thread.
pub trait SearchReporter: Send + Sync {
    fn on_iteration(&self, info: &IterationInfo);
    /// `best` is `None` when the root position has no legal moves
    fn on_best_move(&self, best: Option<Move>, ponder: Option<Move>);
    fn on_perft_divide(&self, mv: Move, nodes: u64);
    fn on_perft_total(&self, nodes: u64);
}

/// Flags shared by every thread of one search
#[derive(Debug, Default)]
pub(crate) struct SearchSignals {
    pub stop: AtomicBool,
    pub ponder: AtomicBool,
    /// A time-out happened while pondering; stop as soon as `ponderhit` arrives
    pub stop_on_ponderhit: AtomicBool,
}

struct RunningSearch {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

/// Search thread pool
pub struct SearchPool {
    tt: Arc<TranspositionTable>,
    threads: usize,
    signals: Arc<SearchSignals>,
    node_counters: Arc<Vec<AtomicU64>>,
    running: Mutex<Option<RunningSearch>>,
}

impl SearchPool {
    pub fn new(threads: usize, hash_mb: usize) -> Self {
        let threads = threads.max(1);
        Self {
            tt: Arc::new(TranspositionTable::new(hash_mb)),
            threads,
            signals: Arc::new(SearchSignals::default()),
            node_counters: Arc::new(counters(threads)),
            running: Mutex::new(None),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Start searching `pos` in the background and return immediately.
    ///
    /// `history_keys` are the Zobrist keys of the game so far, oldest first,
    /// ending with `pos` itself. A search still running is stopped first.
    pub fn start_thinking(
        &mut self,
        pos: &Position,
        history_keys: Vec<u64>,
        limits: SearchLimits,
        config: SearchConfig,
        ponder: bool,
        reporter: Arc<dyn SearchReporter>,
    ) {
        self.stop();
        self.wait_for_search_finished();

        let signals = Arc::new(SearchSignals::default());
        signals.ponder.store(ponder, Ordering::Relaxed);
        self.signals = Arc::clone(&signals);
        self.node_counters = Arc::new(counters(self.threads));

        let job = SearchJob {
            root: pos.clone(),
            history_keys,
            limits,
            config,
            threads: self.threads,
            tt: Arc::clone(&self.tt),
            signals,
            nodes: Arc::clone(&self.node_counters),
            reporter,
        };

        let (done_tx, done_rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("search-main".into())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || {
                job.run();
                // The receiver may already be gone if the pool was dropped
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
                *running = Some(RunningSearch {
                    handle,
                    done: done_rx,
                });
            }
            Err(e) => log::error!("failed to spawn search thread: {e}"),
        }
    }

    /// Ask the running search to finish as soon as possible
    pub fn stop(&self) {
        self.signals.stop.store(true, Ordering::Relaxed);
    }

    /// The opponent played the expected move: continue as a normal search
    pub fn ponderhit(&self) {
        self.signals.ponder.store(false, Ordering::Relaxed);
        if self.signals.stop_on_ponderhit.load(Ordering::Relaxed) {
            self.stop();
        }
    }

    pub fn is_searching(&self) -> bool {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// Block until the current search (if any) has reported its best move
    pub fn wait_for_search_finished(&self) {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(running) = running else { return };

        if running.done.recv().is_err() {
            log::warn!("search thread ended without acknowledging completion");
        }
        if running.handle.join().is_err() {
            log::warn!("search thread panicked");
        }
    }

    /// Nodes searched by the last (or current) search, all threads
    pub fn nodes_searched(&self) -> u64 {
        self.node_counters.iter().map(|n| n.load(Ordering::Relaxed)).sum()
    }

    /// Forget everything learnt by previous searches
    pub fn clear(&mut self) {
        self.wait_for_search_finished();
        self.tt.clear();
    }

    pub fn set_threads(&mut self, threads: usize) {
        self.wait_for_search_finished();
        self.threads = threads.max(1);
        log::debug!("search threads: {}", self.threads);
    }

    pub fn resize_hash(&mut self, mb: usize) {
        self.wait_for_search_finished();
        match Arc::get_mut(&mut self.tt) {
            Some(tt) => tt.resize(mb),
            None => self.tt = Arc::new(TranspositionTable::new(mb)),
        }
    }

    pub fn hash_len(&self) -> usize {
        self.tt.len()
    }

    /// Permille of the table written by the last search
    pub fn hashfull(&self) -> u32 {
        self.tt.hashfull()
    }
}

impl Drop for SearchPool {
    fn drop(&mut self) {
        self.stop();
        self.wait_for_search_finished();
    }
}

fn counters(n: usize) -> Vec<AtomicU64> {
    (0..n).map(|_| AtomicU64::new(0)).collect()
}

/// Everything the main search thread needs, moved into it at start
struct SearchJob {
    root: Position,
    history_keys: Vec<u64>,
    limits: SearchLimits,
    config: SearchConfig,
    threads: usize,
    tt: Arc<TranspositionTable>,
    signals: Arc<SearchSignals>,
    nodes: Arc<Vec<AtomicU64>>,
    reporter: Arc<dyn SearchReporter>,
}

impl SearchJob {
    fn run(self) {
        if self.limits.perft > 0 {
            self.run_perft();
            return;
        }

        let root_moves = self.root_moves();
        if root_moves.is_empty() {
            let score = if self.root.in_check() { -Value::MATE } else { Value::DRAW };
            self.reporter.on_iteration(&IterationInfo {
                depth: 0,
                seldepth: 0,
                multipv: 1,
                score,
                nodes: 0,
                nps: 0,
                hashfull: 0,
                time_ms: self.limits.elapsed(),
                pv: Vec::new(),
            });
            self.wait_while_pondering();
            self.reporter.on_best_move(None, None);
            return;
        }

        self.tt.new_search();
        let time = TimeManager::new(
            &self.limits,
            self.root.side_to_move(),
            self.root.game_ply(),
            self.config.move_overhead,
        );

        let lines = thread::scope(|s| {
            for id in 1..self.threads {
                let worker = self.worker(id, time);
                let root_moves = root_moves.clone();
                let spawned = thread::Builder::new()
                    .name(format!("search-helper-{id}"))
                    .stack_size(SEARCH_STACK_SIZE)
                    .spawn_scoped(s, move || {
                        let mut worker = worker;
                        worker.iterative_deepening(&root_moves, 1, None);
                    });
                if let Err(e) = spawned {
                    log::warn!("failed to spawn helper thread {id}: {e}");
                }
            }

            let mut main = self.worker(0, time);
            let multipv = self.config.multipv.clamp(1, root_moves.len());
            let lines = main.iterative_deepening(&root_moves, multipv, Some(&*self.reporter));

            self.wait_while_pondering();
            self.signals.stop.store(true, Ordering::Relaxed);
            lines
        });

        let best = lines.first();
        let best_move = best
            .and_then(|l| l.pv.first().copied())
            .or_else(|| root_moves.first().copied());
        let ponder_move = best.and_then(|l| l.pv.get(1).copied()).or_else(|| {
            let after = self.root.play(best_move?);
            let data = self.tt.probe(after.key())?;
            data.mv.filter(|&m| after.is_legal(m))
        });
        self.reporter.on_best_move(best_move, ponder_move);
    }

    fn worker(&self, id: usize, time: TimeManager) -> Worker<'_> {
        Worker::new(
            id,
            &self.root,
            &self.history_keys,
            &self.limits,
            time,
            &self.tt,
            &self.signals,
            &self.nodes,
        )
    }

    /// Legal root moves, restricted to `searchmoves` when given
    fn root_moves(&self) -> Vec<Move> {
        let legal = self.root.legal_moves();
        let restricted: Vec<Move> = legal
            .iter()
            .copied()
            .filter(|m| self.limits.searchmoves.contains(m))
            .collect();
        if restricted.is_empty() { legal.to_vec() } else { restricted }
    }

    /// `go infinite` and `go ponder` must not report before `stop` / `ponderhit`
    fn wait_while_pondering(&self) {
        while (self.signals.ponder.load(Ordering::Relaxed) || self.limits.infinite)
            && !self.signals.stop.load(Ordering::Relaxed)
        {
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn run_perft(&self) {
        let mut total = 0;
        for (mv, nodes) in perft_divide(&self.root, self.limits.perft as u32) {
            self.reporter.on_perft_divide(mv, nodes);
            total += nodes;
        }
        self.nodes[0].store(total, Ordering::Relaxed);
        self.reporter.on_perft_total(total);
    }
}

/// Deepest iteration the main thread will start
pub(crate) fn max_depth(limits: &SearchLimits) -> i32 {
    if limits.depth > 0 { limits.depth.min(MAX_PLY - 1) } else { MAX_PLY - 1 }
}
