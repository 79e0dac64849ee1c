//! Time management
//!
//! Turns the clock fields of `SearchLimits` into two budgets for the side to
//! move: `optimum` (checked between iterations) and `maximum` (checked inside
//! the search).

use super::{SearchLimits, TimePoint};
use crate::types::Color;

/// Moves assumed to remain when the GUI does not send `movestogo`
const DEFAULT_MOVES_TO_GO: i64 = 50;

#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    optimum: TimePoint,
    maximum: TimePoint,
    enabled: bool,
}

impl TimeManager {
    pub fn new(limits: &SearchLimits, us: Color, ply: u32, move_overhead: TimePoint) -> Self {
        if limits.movetime > 0 {
            return Self {
                optimum: limits.movetime,
                maximum: limits.movetime,
                enabled: true,
            };
        }
        if !limits.use_time_management() {
            return Self {
                optimum: 0,
                maximum: 0,
                enabled: false,
            };
        }

        let time = limits.time[us.index()].max(1);
        let inc = limits.inc[us.index()].max(0);
        let mtg = if limits.movestogo > 0 {
            i64::from(limits.movestogo).min(DEFAULT_MOVES_TO_GO)
        } else {
            DEFAULT_MOVES_TO_GO
        };

        let time_left = time
            .saturating_add(inc.saturating_mul(mtg - 1))
            .saturating_sub(move_overhead.saturating_mul(2 + mtg))
            .max(1);

        // Spend a little more early in the game, when positions are richer
        let ply = f64::from(ply);
        let opt_scale = if limits.movestogo == 0 {
            (0.0084 + (ply + 3.0).sqrt() * 0.0042).min(0.2 * time as f64 / time_left as f64)
        } else {
            (0.8 + ply / 128.0).min(0.8 * time as f64 / time_left as f64) / mtg as f64
        };
        let max_scale = (4.0 + ply / 12.0).min(7.0);

        let optimum = ((opt_scale * time_left as f64) as TimePoint).max(1);
        let hard_cap = ((time as f64 * 0.8) as TimePoint).saturating_sub(move_overhead);
        let maximum = ((max_scale * optimum as f64) as TimePoint).min(hard_cap).max(optimum);

        Self {
            optimum,
            maximum,
            enabled: true,
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn optimum(&self) -> TimePoint {
        self.optimum
    }

    #[inline]
    pub fn maximum(&self) -> TimePoint {
        self.maximum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movetime_is_exact_budget() {
        let limits = SearchLimits {
            movetime: 1500,
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::White, 0, 30);
        assert!(tm.enabled());
        assert_eq!(tm.optimum(), 1500);
        assert_eq!(tm.maximum(), 1500);
    }

    #[test]
    fn test_depth_limit_disables_clock() {
        let limits = SearchLimits {
            depth: 5,
            time: [60_000, 60_000],
            ..SearchLimits::default()
        };
        assert!(!TimeManager::new(&limits, Color::White, 0, 30).enabled());
    }

    #[test]
    fn test_clock_budgets_are_ordered_and_bounded() {
        let limits = SearchLimits {
            time: [60_000, 10_000],
            inc: [1_000, 0],
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::White, 20, 30);
        assert!(tm.optimum() > 0);
        assert!(tm.optimum() <= tm.maximum());
        assert!(tm.maximum() < 60_000);

        let black = TimeManager::new(&limits, Color::Black, 21, 30);
        assert!(black.maximum() < 10_000);
        assert!(black.optimum() < tm.optimum());
    }

    #[test]
    fn test_huge_clock_does_not_overflow() {
        let limits = SearchLimits {
            time: [i64::MAX, i64::MAX],
            inc: [i64::MAX, i64::MAX],
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::White, 0, 5000);
        assert!(tm.enabled());
        assert!(tm.optimum() > 0);
        assert!(tm.optimum() <= tm.maximum());
    }

    #[test]
    fn test_movestogo_spreads_time() {
        let limits = SearchLimits {
            time: [40_000, 40_000],
            movestogo: 10,
            ..SearchLimits::default()
        };
        let tm = TimeManager::new(&limits, Color::White, 40, 0);
        assert!(tm.optimum() > 2_000 && tm.optimum() < 8_000, "{}", tm.optimum());
    }
}
