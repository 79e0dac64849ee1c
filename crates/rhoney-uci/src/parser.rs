//! UCI command parser
//!
//! Pure text to `Command` conversion. Aliases are resolved here so that the
//! dispatcher only ever sees canonical commands.

use std::str::FromStr;

use log::{debug, warn};

use crate::alias;
use crate::commands::{Command, GoParams, PositionStart};
use crate::error::UciError;

/// Parse one input line
pub fn parse_command(line: &str) -> Command {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&first, rest)) = parts.split_first() else {
        return Command::Empty;
    };

    match alias::command(first) {
        "uci" => Command::Uci,
        "isready" => Command::IsReady,
        "ucinewgame" => Command::UciNewGame,
        "quit" => Command::Quit,
        "stop" => Command::Stop,
        "ponderhit" => Command::PonderHit,
        "setoption" => parse_setoption(rest),
        "set" => parse_set(rest),
        "position" => parse_position(rest),
        "go" => Command::Go(parse_go(rest)),
        "d" => Command::Display,
        "flip" => Command::Flip,
        "eval" => Command::Eval,
        "compiler" => Command::Compiler,
        "bench" => Command::Bench(rest.iter().map(|s| s.to_string()).collect()),
        _ => Command::Unknown(line.trim().to_string()),
    }
}

/// `name <tokens...> value <tokens...>`; the first token is taken to be
/// `name` whatever it says
fn parse_setoption(parts: &[&str]) -> Command {
    let body = parts.get(1..).unwrap_or_default();
    let value_pos = body.iter().position(|&p| p == "value");

    let (name, value) = match value_pos {
        Some(pos) => (body[..pos].join(" "), body[pos + 1..].join(" ")),
        None => (body.join(" "), String::new()),
    };
    Command::SetOption { name, value }
}

/// `set <name> <value...>`: one-token name, the rest is the value
fn parse_set(parts: &[&str]) -> Command {
    let name = parts.first().map_or_else(String::new, |s| s.to_string());
    let value = parts.get(1..).unwrap_or_default().join(" ");
    Command::Set { name, value }
}

/// `startpos [moves ...]` or `fen <fields...> [moves ...]`
fn parse_position(parts: &[&str]) -> Command {
    let Some((&first, rest)) = parts.split_first() else {
        debug!("position without arguments ignored");
        return Command::Empty;
    };

    let (start, moves) = match alias::position_keyword(first) {
        // The token after `startpos` is taken to be `moves`
        "startpos" => (PositionStart::StartPos, rest.get(1..).unwrap_or_default()),
        "fen" => {
            let end = rest.iter().position(|&p| p == "moves").unwrap_or(rest.len());
            let fen = rest[..end].join(" ");
            (PositionStart::Fen(fen), rest.get(end + 1..).unwrap_or_default())
        }
        other => {
            warn!("position: expected 'startpos' or 'fen', got '{other}'");
            return Command::Empty;
        }
    };

    Command::Position {
        start,
        moves: moves.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse_go(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 0;

    while i < parts.len() {
        let keyword = alias::go_keyword(parts[i]);
        i += 1;

        match keyword {
            "searchmoves" => {
                params.searchmoves = parts[i..].iter().map(|s| s.to_string()).collect();
                break;
            }
            "infinite" => params.infinite = true,
            "ponder" => params.ponder = true,
            "wtime" => number(keyword, parts, &mut i, &mut params.wtime),
            "btime" => number(keyword, parts, &mut i, &mut params.btime),
            "winc" => number(keyword, parts, &mut i, &mut params.winc),
            "binc" => number(keyword, parts, &mut i, &mut params.binc),
            "movestogo" => number(keyword, parts, &mut i, &mut params.movestogo),
            "depth" => number(keyword, parts, &mut i, &mut params.depth),
            "nodes" => number(keyword, parts, &mut i, &mut params.nodes),
            "movetime" => number(keyword, parts, &mut i, &mut params.movetime),
            "mate" => number(keyword, parts, &mut i, &mut params.mate),
            "perft" => number(keyword, parts, &mut i, &mut params.perft),
            "mt" => {
                let mut seconds = 0i64;
                number(keyword, parts, &mut i, &mut seconds);
                params.movetime = seconds.saturating_mul(1000);
            }
            other => debug!("go: ignoring token '{other}'"),
        }
    }
    params
}

/// Consume the token at `*i` as the value of `keyword`.
///
/// A malformed token is still consumed; `target` keeps its value.
fn number<T: FromStr>(keyword: &str, parts: &[&str], i: &mut usize, target: &mut T) {
    let Some(token) = parts.get(*i) else {
        debug!("go: '{keyword}' without a value");
        return;
    };
    *i += 1;
    match parse_number(keyword, token) {
        Ok(v) => *target = v,
        Err(e) => warn!("{e}"),
    }
}

pub(crate) fn parse_number<T: FromStr>(keyword: &str, token: &str) -> Result<T, UciError> {
    token.parse().map_err(|_| UciError::InvalidNumber {
        keyword: keyword.to_string(),
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands_and_aliases() {
        assert_eq!(parse_command("uci"), Command::Uci);
        assert_eq!(parse_command("  isready  "), Command::IsReady);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("?"), Command::Stop);
        assert_eq!(parse_command("c++"), Command::Compiler);
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn test_unknown_command_keeps_whole_line() {
        assert_eq!(
            parse_command("frobnicate the board"),
            Command::Unknown("frobnicate the board".to_string())
        );
    }

    #[test]
    fn test_setoption_names_and_values_with_spaces() {
        assert_eq!(
            parse_command("setoption name Move Overhead value 100"),
            Command::SetOption {
                name: "Move Overhead".to_string(),
                value: "100".to_string()
            }
        );
        assert_eq!(
            parse_command("so name Clear Hash"),
            Command::SetOption {
                name: "Clear Hash".to_string(),
                value: String::new()
            }
        );
        assert_eq!(
            parse_command("setoption name Score Output value ScorPct GUI"),
            Command::SetOption {
                name: "Score Output".to_string(),
                value: "ScorPct GUI".to_string()
            }
        );
    }

    #[test]
    fn test_set_shortcut() {
        assert_eq!(
            parse_command("s t 4"),
            Command::Set {
                name: "t".to_string(),
                value: "4".to_string()
            }
        );
        assert_eq!(
            parse_command("set"),
            Command::Set {
                name: String::new(),
                value: String::new()
            }
        );
    }

    #[test]
    fn test_position_startpos_and_fen() {
        assert_eq!(
            parse_command("position startpos moves e2e4 e7e5"),
            Command::Position {
                start: PositionStart::StartPos,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()]
            }
        );
        assert_eq!(
            parse_command("p f 4k3/8/8/8/8/8/8/4K3 w - - 0 1 moves e1e2"),
            Command::Position {
                start: PositionStart::Fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1".to_string()),
                moves: vec!["e1e2".to_string()]
            }
        );
        assert_eq!(parse_command("position middlegame"), Command::Empty);
    }

    #[test]
    fn test_startpos_consumes_one_token() {
        assert_eq!(
            parse_command("position startpos e2e4 e7e5"),
            Command::Position {
                start: PositionStart::StartPos,
                moves: vec!["e7e5".to_string()]
            }
        );
    }

    #[test]
    fn test_go_fields_and_aliases() {
        let line = "go wtime 1000 btime 2000 winc 10 binc 20 movestogo 5 d 7 nodes 99";
        let Command::Go(p) = parse_command(line) else {
            panic!("not a go command");
        };
        assert_eq!((p.wtime, p.btime, p.winc, p.binc), (1000, 2000, 10, 20));
        assert_eq!((p.movestogo, p.depth, p.nodes), (5, 7, 99));

        let Command::Go(p) = parse_command("g i m 3 mt 2 ponder") else {
            panic!("not a go command");
        };
        assert!(p.infinite && p.ponder);
        assert_eq!(p.mate, 3);
        assert_eq!(p.movetime, 2000);
    }

    #[test]
    fn test_searchmoves_consumes_rest_of_line() {
        let line = "go depth 3 searchmoves e2e4 d2d4 depth 9 infinite";
        let Command::Go(p) = parse_command(line) else {
            panic!("not a go command");
        };
        assert_eq!(p.depth, 3);
        assert!(!p.infinite);
        assert_eq!(p.searchmoves, vec!["e2e4", "d2d4", "depth", "9", "infinite"]);

        let Command::Go(p) = parse_command("go sm a2a3") else {
            panic!("not a go command");
        };
        assert_eq!(p.searchmoves, vec!["a2a3"]);
    }

    #[test]
    fn test_malformed_number_is_consumed_and_defaults() {
        let Command::Go(p) = parse_command("go depth x nodes 50") else {
            panic!("not a go command");
        };
        assert_eq!(p.depth, 0);
        assert_eq!(p.nodes, 50);

        let Command::Go(p) = parse_command("go movetime") else {
            panic!("not a go command");
        };
        assert_eq!(p.movetime, 0);
    }

    #[test]
    fn test_parse_number_error_names_keyword() {
        let err = parse_number::<u64>("nodes", "lots").unwrap_err();
        assert_eq!(err.to_string(), "invalid number 'lots' after 'nodes'");
    }

    #[test]
    fn test_bench_args() {
        assert_eq!(
            parse_command("b 32 2 5 default nodes"),
            Command::Bench(
                ["32", "2", "5", "default", "nodes"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            )
        );
    }
}
