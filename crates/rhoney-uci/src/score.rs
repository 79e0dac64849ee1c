//! Score formatting for `info ... score` fields
//!
//! Mate scores are reported in moves. Other scores use the encoding chosen by
//! the `Score Output` option.

use std::fmt;
use std::str::FromStr;

use rhoney_core::Value;

/// Base of the logistic win-probability curve
const SCORE_PCT_BASE: f64 = 2.15;
/// Internal units to centipawns
const CENTIPAWN_FACTOR: f64 = 0.31492;

/// Encodings selectable through `Score Output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreOutput {
    /// Linear centipawns
    #[default]
    Centipawn,
    /// Win probability in hundredths of a percent, sent as `cp` for GUIs
    /// that divide centipawns by 100
    PercentGui,
    /// Win probability in percent with two decimals
    Percent,
}

impl ScoreOutput {
    pub const ALL: [ScoreOutput; 3] = [
        ScoreOutput::Centipawn,
        ScoreOutput::PercentGui,
        ScoreOutput::Percent,
    ];

    /// Spelling used by the option table
    pub fn name(self) -> &'static str {
        match self {
            ScoreOutput::Centipawn => "Centipawn",
            ScoreOutput::PercentGui => "ScorPct-GUI",
            ScoreOutput::Percent => "ScorPct",
        }
    }
}

impl fmt::Display for ScoreOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreOutput::ALL
            .into_iter()
            .find(|o| o.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

/// Logistic transform of an internal value, in `0.0..1.0`
fn win_ratio(v: Value) -> f64 {
    let p = SCORE_PCT_BASE.powf(SCORE_PCT_BASE * f64::from(v.raw()) / 1000.0);
    p / (p + 1.0)
}

/// Fixed-point text without a negative zero
fn fixed(x: f64, decimals: usize) -> String {
    let text = format!("{x:.decimals$}");
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// `cp <n>` or `mate <n>` text for `v`
pub fn format_value(v: Value, mode: ScoreOutput) -> String {
    let raw = v.raw();
    if raw.abs() < Value::MATE_IN_MAX_PLY.raw() {
        let text = match mode {
            ScoreOutput::PercentGui => fixed(10000.0 * win_ratio(v), 0),
            ScoreOutput::Centipawn => fixed(f64::from(raw) * CENTIPAWN_FACTOR, 0),
            ScoreOutput::Percent => fixed(100.0 * win_ratio(v), 2),
        };
        format!("cp {text}")
    } else {
        let mate = Value::MATE.raw();
        let moves = if raw > 0 { (mate - raw + 1) / 2 } else { (-mate - raw) / 2 };
        format!("mate {moves}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centipawn_scaling() {
        assert_eq!(format_value(Value::new(0), ScoreOutput::Centipawn), "cp 0");
        assert_eq!(format_value(Value::new(100), ScoreOutput::Centipawn), "cp 31");
        assert_eq!(format_value(Value::new(-318), ScoreOutput::Centipawn), "cp -100");
        assert_eq!(format_value(Value::new(-1), ScoreOutput::Centipawn), "cp 0");
    }

    #[test]
    fn test_percentages_are_centred_on_fifty() {
        assert_eq!(format_value(Value::ZERO, ScoreOutput::PercentGui), "cp 5000");
        assert_eq!(format_value(Value::ZERO, ScoreOutput::Percent), "cp 50.00");
        let winning = format_value(Value::new(1000), ScoreOutput::Percent);
        let pct: f64 = winning.trim_start_matches("cp ").parse().unwrap();
        assert!(pct > 80.0 && pct < 100.0, "{winning}");
    }

    #[test]
    fn test_percentages_of_a_known_value() {
        // 2.15^2.15 / (1 + 2.15^2.15) = 0.838317
        assert_eq!(format_value(Value::new(1000), ScoreOutput::PercentGui), "cp 8383");
        assert_eq!(format_value(Value::new(1000), ScoreOutput::Percent), "cp 83.83");
        assert_eq!(format_value(Value::new(-1000), ScoreOutput::PercentGui), "cp 1617");
        assert_eq!(format_value(Value::new(-1000), ScoreOutput::Percent), "cp 16.17");
    }

    #[test]
    fn test_mate_threshold_boundary() {
        let threshold = Value::MATE_IN_MAX_PLY.raw();
        assert!(format_value(Value::new(threshold - 1), ScoreOutput::Centipawn).starts_with("cp "));
        assert!(format_value(Value::new(threshold), ScoreOutput::Centipawn).starts_with("mate "));
        let losing = format_value(Value::new(-(threshold - 1)), ScoreOutput::Percent);
        assert!(losing.starts_with("cp "));
    }

    #[test]
    fn test_mate_in_moves_not_plies() {
        assert_eq!(format_value(Value::mate_in(1), ScoreOutput::Centipawn), "mate 1");
        assert_eq!(format_value(Value::mate_in(3), ScoreOutput::Centipawn), "mate 2");
        assert_eq!(format_value(Value::mated_in(2), ScoreOutput::Centipawn), "mate -1");
        assert_eq!(format_value(-Value::MATE, ScoreOutput::Percent), "mate 0");
    }

    #[test]
    fn test_score_output_names() {
        assert_eq!("scorpct-gui".parse::<ScoreOutput>(), Ok(ScoreOutput::PercentGui));
        assert_eq!("Centipawn".parse::<ScoreOutput>(), Ok(ScoreOutput::Centipawn));
        assert!("Pawns".parse::<ScoreOutput>().is_err());
        assert_eq!(ScoreOutput::Percent.to_string(), "ScorPct");
    }
}
