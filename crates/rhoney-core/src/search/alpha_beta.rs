//! Alpha-beta search worker
//!
//! Principal variation search with quiescence, transposition table cutoffs,
//! check extension, mate distance pruning, killer moves and MVV-LVA capture
//! ordering. One `Worker` runs per thread; only the main worker (id 0)
//! checks the clock and the node budget.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{IterationInfo, SearchLimits, SearchReporter, SearchSignals, TimeManager, max_depth};
use crate::eval::evaluate;
use crate::movegen::{MoveList, generate_pseudo};
use crate::position::Position;
use crate::tt::{TTData, TranspositionTable, value_from_tt, value_to_tt};
use crate::types::{Bound, MAX_PLY, Move, PieceType, Value};

/// Nodes between clock checks on the main thread
const CHECK_INTERVAL: u64 = 1024;

/// A finished principal variation at the root
#[derive(Debug, Clone)]
pub(crate) struct RootLine {
    pub pv: Vec<Move>,
    pub score: Value,
    pub depth: i32,
    pub seldepth: i32,
}

pub(crate) struct Worker<'a> {
    id: usize,
    root: &'a Position,
    limits: &'a SearchLimits,
    time: TimeManager,
    tt: &'a TranspositionTable,
    signals: &'a SearchSignals,
    nodes: &'a [AtomicU64],
    /// Game keys followed by the keys along the current search path
    keys: Vec<u64>,
    killers: Vec<[Option<Move>; 2]>,
    pv: Vec<Vec<Move>>,
    root_order: Vec<Move>,
    root_depth: i32,
    seldepth: i32,
    local_nodes: u64,
    stopped: bool,
}

impl<'a> Worker<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        root: &'a Position,
        history_keys: &[u64],
        limits: &'a SearchLimits,
        time: TimeManager,
        tt: &'a TranspositionTable,
        signals: &'a SearchSignals,
        nodes: &'a [AtomicU64],
    ) -> Self {
        let mut keys = history_keys.to_vec();
        if keys.last() != Some(&root.key()) {
            keys.push(root.key());
        }
        let slots = MAX_PLY as usize + 2;
        Self {
            id,
            root,
            limits,
            time,
            tt,
            signals,
            nodes,
            keys,
            killers: vec![[None; 2]; slots],
            pv: vec![Vec::new(); slots],
            root_order: Vec::new(),
            root_depth: 0,
            seldepth: 0,
            local_nodes: 0,
            stopped: false,
        }
    }

    #[inline]
    fn is_main(&self) -> bool {
        self.id == 0
    }

    /// Deepen until the depth limit or a stop, searching `multipv` lines per
    /// iteration. Returns the lines of the last completed iteration, best first.
    pub fn iterative_deepening(
        &mut self,
        root_moves: &[Move],
        multipv: usize,
        reporter: Option<&dyn SearchReporter>,
    ) -> Vec<RootLine> {
        self.root_order = root_moves.to_vec();
        let mut lines: Vec<RootLine> = Vec::new();
        // Helpers start staggered so threads do not all search the same depth
        let first_depth = 1 + (self.id % 2) as i32;

        for depth in first_depth..=max_depth(self.limits) {
            self.root_depth = depth;
            self.seldepth = 0;
            let mut iteration: Vec<RootLine> = Vec::with_capacity(multipv);

            for _ in 0..multipv {
                let candidates: Vec<Move> = self
                    .root_order
                    .iter()
                    .copied()
                    .filter(|m| !iteration.iter().any(|l| l.pv.first() == Some(m)))
                    .collect();
                if candidates.is_empty() {
                    break;
                }
                match self.search_root(&candidates, depth) {
                    Some(line) => iteration.push(line),
                    None => break,
                }
            }

            if self.stopped {
                if lines.is_empty() && !iteration.is_empty() {
                    lines = iteration;
                }
                break;
            }

            iteration.sort_by_key(|l| Reverse(l.score));
            for line in iteration.iter().rev() {
                if let Some(&m) = line.pv.first() {
                    self.root_order.retain(|&r| r != m);
                    self.root_order.insert(0, m);
                }
            }
            lines = iteration;

            if !self.is_main() {
                continue;
            }
            if let Some(reporter) = reporter {
                self.report(reporter, &lines);
            }
            if self.iteration_says_stop(&lines) {
                break;
            }
        }
        lines
    }

    fn report(&self, reporter: &dyn SearchReporter, lines: &[RootLine]) {
        let nodes = self.total_nodes();
        let time_ms = self.limits.elapsed();
        let nps = nodes * 1000 / (time_ms.max(1) as u64);
        let hashfull = self.tt.hashfull();
        for (i, line) in lines.iter().enumerate() {
            reporter.on_iteration(&IterationInfo {
                depth: line.depth,
                seldepth: line.seldepth,
                multipv: i + 1,
                score: line.score,
                nodes,
                nps,
                hashfull,
                time_ms,
                pv: line.pv.clone(),
            });
        }
    }

    /// Checks made between iterations: proven mate and the optimum time
    fn iteration_says_stop(&mut self, lines: &[RootLine]) -> bool {
        let mate_found = lines.first().is_some_and(|best| {
            best.score.is_win()
                && Value::MATE.raw() - best.score.raw() <= self.limits.mate.saturating_mul(2)
        });
        if self.limits.mate > 0 && mate_found {
            self.signals.stop.store(true, Ordering::Relaxed);
            return true;
        }

        if self.time.enabled() && self.limits.elapsed() >= self.time.optimum() {
            if self.signals.ponder.load(Ordering::Relaxed) {
                self.signals.stop_on_ponderhit.store(true, Ordering::Relaxed);
            } else {
                self.signals.stop.store(true, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    fn search_root(&mut self, moves: &[Move], depth: i32) -> Option<RootLine> {
        let mut alpha = -Value::INFINITE;
        let beta = Value::INFINITE;
        let mut best: Option<RootLine> = None;
        let root = self.root;

        for (i, &m) in moves.iter().enumerate() {
            let next = root.play(m);
            let ext = i32::from(next.in_check());
            self.keys.push(next.key());
            let v = if i == 0 {
                -self.search(&next, depth - 1 + ext, -beta, -alpha, 1, true)
            } else {
                let v = -self.search(&next, depth - 1 + ext, -alpha - 1, -alpha, 1, false);
                if v > alpha {
                    -self.search(&next, depth - 1 + ext, -beta, -alpha, 1, true)
                } else {
                    v
                }
            };
            self.keys.pop();

            if self.stopped {
                return None;
            }
            if v > alpha {
                alpha = v;
                let mut pv = vec![m];
                pv.extend_from_slice(&self.pv[1]);
                best = Some(RootLine {
                    pv,
                    score: v,
                    depth,
                    seldepth: self.seldepth,
                });
            }
        }
        best
    }

    fn search(
        &mut self,
        pos: &Position,
        depth: i32,
        mut alpha: Value,
        mut beta: Value,
        ply: i32,
        pv_node: bool,
    ) -> Value {
        if depth <= 0 {
            return self.qsearch(pos, alpha, beta, ply);
        }

        let p = ply as usize;
        self.pv[p].clear();
        if self.visit_node(ply) {
            return Value::ZERO;
        }

        if self.is_draw(pos) {
            return Value::DRAW;
        }
        if ply >= MAX_PLY - 1 {
            return if pos.in_check() { Value::DRAW } else { evaluate(pos) };
        }

        alpha = alpha.max(Value::mated_in(ply));
        beta = beta.min(Value::mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }

        let key = pos.key();
        let tt_data = self.tt.probe(key);
        let tt_move = tt_data.and_then(|d| d.mv);
        if let Some(d) = tt_data.filter(|d| !pv_node && d.depth >= depth) {
            let v = value_from_tt(d.value, ply);
            if (v >= beta && d.bound.includes_lower()) || (v <= alpha && d.bound.includes_upper()) {
                return v;
            }
        }

        let in_check = pos.in_check();
        let mut list = MoveList::new();
        generate_pseudo(pos, false, &mut list);
        self.order(pos, &mut list, tt_move, p);

        let orig_alpha = alpha;
        let mut best_value = -Value::INFINITE;
        let mut best_move = None;
        let mut legal = 0;

        for m in list {
            let next = pos.play(m);
            if next.left_king_in_check() {
                continue;
            }
            legal += 1;

            let ext = i32::from(next.in_check() && ply < 2 * self.root_depth);
            let new_depth = depth - 1 + ext;

            self.keys.push(next.key());
            let v = if legal == 1 {
                -self.search(&next, new_depth, -beta, -alpha, ply + 1, pv_node)
            } else {
                let v = -self.search(&next, new_depth, -alpha - 1, -alpha, ply + 1, false);
                if pv_node && v > alpha && v < beta {
                    -self.search(&next, new_depth, -beta, -alpha, ply + 1, true)
                } else {
                    v
                }
            };
            self.keys.pop();

            if self.stopped {
                return Value::ZERO;
            }

            if v > best_value {
                best_value = v;
                if v > alpha {
                    best_move = Some(m);
                    if pv_node {
                        self.update_pv(p, m);
                    }
                    if v >= beta {
                        if !pos.is_capture(m) && m.promotion().is_none() {
                            self.store_killer(p, m);
                        }
                        break;
                    }
                    alpha = v;
                }
            }
        }

        if legal == 0 {
            return if in_check { Value::mated_in(ply) } else { Value::DRAW };
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if best_value > orig_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.store(
            key,
            TTData {
                mv: best_move,
                value: value_to_tt(best_value, ply),
                eval: Value::NONE,
                depth,
                bound,
            },
        );
        best_value
    }

    fn qsearch(&mut self, pos: &Position, mut alpha: Value, beta: Value, ply: i32) -> Value {
        let p = ply as usize;
        self.pv[p].clear();
        if self.visit_node(ply) {
            return Value::ZERO;
        }
        if ply >= MAX_PLY - 1 {
            return evaluate(pos);
        }

        let in_check = pos.in_check();
        let mut best = if in_check {
            -Value::INFINITE
        } else {
            let stand_pat = evaluate(pos);
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            stand_pat
        };

        let mut list = MoveList::new();
        generate_pseudo(pos, !in_check, &mut list);
        self.order(pos, &mut list, None, p);

        let mut legal = 0;
        for m in list {
            let next = pos.play(m);
            if next.left_king_in_check() {
                continue;
            }
            legal += 1;

            let v = -self.qsearch(&next, -beta, -alpha, ply + 1);
            if self.stopped {
                return Value::ZERO;
            }
            if v > best {
                best = v;
                if v > alpha {
                    if v >= beta {
                        return v;
                    }
                    alpha = v;
                }
            }
        }

        if in_check && legal == 0 {
            return Value::mated_in(ply);
        }
        best
    }

    /// Count a node and poll the stop conditions. True means "unwind now".
    #[inline]
    fn visit_node(&mut self, ply: i32) -> bool {
        self.nodes[self.id].fetch_add(1, Ordering::Relaxed);
        self.local_nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.is_main() && self.local_nodes % CHECK_INTERVAL == 0 {
            self.check_limits();
        }
        if !self.stopped && self.signals.stop.load(Ordering::Relaxed) {
            self.stopped = true;
        }
        self.stopped
    }

    fn check_limits(&self) {
        if self.limits.nodes > 0 && self.total_nodes() >= self.limits.nodes {
            self.signals.stop.store(true, Ordering::Relaxed);
            return;
        }
        if self.signals.ponder.load(Ordering::Relaxed) {
            return;
        }
        if self.time.enabled() && self.limits.elapsed() >= self.time.maximum() {
            self.signals.stop.store(true, Ordering::Relaxed);
        }
    }

    fn total_nodes(&self) -> u64 {
        self.nodes.iter().map(|n| n.load(Ordering::Relaxed)).sum()
    }

    /// Fifty-move rule or a repetition of any earlier position within the
    /// reversible window
    fn is_draw(&self, pos: &Position) -> bool {
        if pos.rule50() >= 100 {
            return true;
        }
        let n = self.keys.len();
        let window = (pos.rule50() as usize).min(n.saturating_sub(1));
        (4..=window)
            .step_by(2)
            .any(|back| self.keys[n - 1 - back] == pos.key())
    }

    fn order(&self, pos: &Position, list: &mut MoveList, tt_move: Option<Move>, ply: usize) {
        let killers = self.killers[ply];
        list.sort_by_cached_key(|&m| {
            let score = if Some(m) == tt_move {
                1_000_000
            } else if pos.is_capture(m) {
                let victim = pos.piece_on(m.to()).map_or(PieceType::Pawn, |p| p.kind);
                let attacker = pos.piece_on(m.from()).map_or(PieceType::Pawn, |p| p.kind);
                100_000 + 10 * victim.index() as i32 - attacker.index() as i32
            } else if m.promotion() == Some(PieceType::Queen) {
                90_000
            } else if killers[0] == Some(m) {
                80_000
            } else if killers[1] == Some(m) {
                79_000
            } else {
                0
            };
            Reverse(score)
        });
    }

    fn store_killer(&mut self, ply: usize, m: Move) {
        let slot = &mut self.killers[ply];
        if slot[0] != Some(m) {
            slot[1] = slot[0];
            slot[0] = Some(m);
        }
    }

    fn update_pv(&mut self, ply: usize, m: Move) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(m);
        line.extend_from_slice(&tail[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repetition_detected_from_game_history() {
        let pos = Position::startpos();
        let limits = SearchLimits::default();
        let tt = TranspositionTable::new(1);
        let signals = SearchSignals::default();
        let nodes = [AtomicU64::new(0)];
        let time = TimeManager::new(&limits, pos.side_to_move(), 0, 0);

        // Nf3 Nf6 Ng1 Ng8 brings the start position back
        let mut keys = vec![pos.key()];
        let mut cur = pos.clone();
        for (f, t) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
            let m = Move::normal(
                crate::types::Square::parse(f).unwrap(),
                crate::types::Square::parse(t).unwrap(),
            );
            cur = cur.play(m);
            keys.push(cur.key());
        }
        assert_eq!(cur.key(), pos.key());

        let worker = Worker::new(0, &cur, &keys, &limits, time, &tt, &signals, &nodes);
        assert!(worker.is_draw(&cur));

        let fresh = Worker::new(0, &pos, &[pos.key()], &limits, time, &tt, &signals, &nodes);
        assert!(!fresh.is_draw(&pos));
    }

    #[test]
    fn test_stop_flag_unwinds_search() {
        let pos = Position::startpos();
        let limits = SearchLimits::default();
        let tt = TranspositionTable::new(1);
        let signals = SearchSignals::default();
        signals.stop.store(true, Ordering::Relaxed);
        let nodes = [AtomicU64::new(0)];
        let time = TimeManager::new(&limits, pos.side_to_move(), 0, 0);
        let mut worker = Worker::new(0, &pos, &[pos.key()], &limits, time, &tt, &signals, &nodes);
        let moves = pos.legal_moves().to_vec();
        assert!(worker.iterative_deepening(&moves, 1, None).is_empty());
    }
}
