//! UCI option table
//!
//! Names are fixed at construction; only values change. Lookups are
//! case-sensitive. Side effects on the engine are not applied here: `set`
//! returns an `OptionHook` and the session runs it.

use std::fmt;

use crate::error::{Result, UciError};
use crate::score::ScoreOutput;

pub const THREADS: &str = "Threads";
pub const HASH: &str = "Hash";
pub const CLEAR_HASH: &str = "Clear Hash";
pub const PONDER: &str = "Ponder";
pub const MULTI_PV: &str = "MultiPV";
pub const MOVE_OVERHEAD: &str = "Move Overhead";
pub const UCI_CHESS960: &str = "UCI_Chess960";
pub const SCORE_OUTPUT: &str = "Score Output";
pub const MIN_OUTPUT: &str = "Min Output";
pub const CLEAN_SEARCH: &str = "Clean_Search";

/// Option types as advertised by `uci`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    Check { default: bool },
    Spin { default: i64, min: i64, max: i64 },
    Combo { default: String, vars: Vec<String> },
    Button,
}

/// Engine-side effect of changing an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionHook {
    SetThreads(usize),
    ResizeHash(usize),
    ClearHash,
}

#[derive(Debug, Clone)]
pub struct EngineOption {
    name: &'static str,
    kind: OptionKind,
    value: String,
}

impl EngineOption {
    fn check(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: OptionKind::Check { default },
            value: default.to_string(),
        }
    }

    fn spin(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: OptionKind::Spin { default, min, max },
            value: default.to_string(),
        }
    }

    fn combo(name: &'static str, default: &str, vars: &[&str]) -> Self {
        Self {
            name,
            kind: OptionKind::Combo {
                default: default.to_string(),
                vars: vars.iter().map(|v| v.to_string()).collect(),
            },
            value: default.to_string(),
        }
    }

    fn button(name: &'static str) -> Self {
        Self {
            name,
            kind: OptionKind::Button,
            value: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Validate `raw` against the option type, returning the stored spelling
    fn normalize(&self, raw: &str) -> Option<String> {
        match &self.kind {
            OptionKind::Check { .. } => match raw {
                "true" | "false" => Some(raw.to_string()),
                _ => None,
            },
            OptionKind::Spin { min, max, .. } => {
                let v: i64 = raw.parse().ok()?;
                (*min..=*max).contains(&v).then(|| v.to_string())
            }
            OptionKind::Combo { vars, .. } => {
                vars.iter().find(|var| var.eq_ignore_ascii_case(raw)).cloned()
            }
            OptionKind::Button => Some(String::new()),
        }
    }
}

impl fmt::Display for EngineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name;
        match &self.kind {
            OptionKind::Check { default } => {
                write!(f, "option name {name} type check default {default}")
            }
            OptionKind::Spin { default, min, max } => {
                write!(f, "option name {name} type spin default {default} min {min} max {max}")
            }
            OptionKind::Combo { default, vars } => {
                write!(f, "option name {name} type combo default {default}")?;
                for var in vars {
                    write!(f, " var {var}")?;
                }
                Ok(())
            }
            OptionKind::Button => write!(f, "option name {name} type button"),
        }
    }
}

/// Options in declaration order
#[derive(Debug, Clone)]
pub struct OptionTable {
    options: Vec<EngineOption>,
}

impl Default for OptionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionTable {
    pub fn new() -> Self {
        let score_vars: Vec<&str> = ScoreOutput::ALL.iter().map(|o| o.name()).collect();
        Self {
            options: vec![
                EngineOption::spin(THREADS, 1, 1, 512),
                EngineOption::spin(HASH, 16, 1, 131_072),
                EngineOption::button(CLEAR_HASH),
                EngineOption::check(PONDER, false),
                EngineOption::spin(MULTI_PV, 1, 1, 500),
                EngineOption::spin(MOVE_OVERHEAD, 30, 0, 5000),
                EngineOption::check(UCI_CHESS960, false),
                EngineOption::combo(SCORE_OUTPUT, ScoreOutput::default().name(), &score_vars),
                EngineOption::check(MIN_OUTPUT, false),
                EngineOption::check(CLEAN_SEARCH, false),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineOption> {
        self.options.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn find(&self, name: &str) -> Option<&EngineOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Current value; buttons have an empty value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(EngineOption::value)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn get_int(&self, name: &str) -> i64 {
        self.get(name).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    pub fn score_output(&self) -> ScoreOutput {
        self.get(SCORE_OUTPUT).and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Store a new value. Unknown names and invalid values leave the table
    /// unchanged.
    pub fn set(&mut self, name: &str, value: &str) -> Result<Option<OptionHook>> {
        let option = self
            .options
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| UciError::NoSuchOption(name.to_string()))?;

        let normalized = option.normalize(value).ok_or_else(|| UciError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        })?;
        let number = normalized.parse::<usize>().unwrap_or(0);
        let hook = match option.name {
            THREADS => Some(OptionHook::SetThreads(number)),
            HASH => Some(OptionHook::ResizeHash(number)),
            CLEAR_HASH => Some(OptionHook::ClearHash),
            _ => None,
        };
        option.value = normalized;
        Ok(hook)
    }
}

impl fmt::Display for OptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{option}")?;
        }
        Ok(())
    }
}
