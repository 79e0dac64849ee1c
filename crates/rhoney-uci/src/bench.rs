//! `bench`: replay a canned command script through the dispatcher and report
//! search throughput on stderr

use std::fs;
use std::time::Instant;

use log::{debug, warn};
use rhoney_core::eval;

use crate::commands::Command;
use crate::dispatch::Uci;
use crate::error::{Result, UciError};
use crate::parser::parse_command;

/// Rates at or above this are printed in thousands with a `k` suffix
const NPS_DISPLAY_LIMIT: u64 = 10_000_000;

const DEFAULT_POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 10",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 11",
    "4rrk1/pp1n3p/3q2pQ/2p1pb2/2PP4/2P3N1/P2B2PP/4RRK1 b - - 7 19",
    "rq3rk1/ppp2ppp/1bnpb3/3N2B1/3NP3/7P/PPPQ1PP1/2KR3R w - - 7 14 moves d4e6",
    "r1bq1r1k/1pp1n1pp/1p1p4/4p2Q/4Pp2/1BNP4/PPP2PPP/3R1RK1 w - - 2 14 moves g2g4",
    "r3r1k1/2p2ppp/p1p1bn2/8/1q2P3/2NPQN2/PPP3PP/R4RK1 b - - 2 15",
    "r1bbk1nr/pp3p1p/2n5/1N4p1/2Np1B2/8/PPP2PPP/2KR1B1R w kq - 0 13",
    "r1bq1rk1/ppp1nppp/4n3/3p3Q/3P4/1BP1B3/PP1N2PP/R4RK1 w - - 1 16",
    "4r1k1/r1q2ppp/ppp2n2/4P3/5Rb1/1N1BQ3/PPP3PP/R5K1 w - - 1 17",
    "2rqkb1r/ppp2p2/2npb1p1/1N1Nn2p/2P1PP2/8/PP2B1PP/R1BQK2R b KQ - 0 11",
    "3r1rk1/p5pp/bpp1pp2/8/q1PP1P2/b3P3/P2NQRPP/1R2B1K1 b - - 6 22",
    "8/8/8/8/5kp1/P7/8/1K1N4 w - - 0 80",
    // Stalemate
    "7k/7P/6K1/8/3B4/8/8/8 b - - 0 1",
    // Chess960
    "setoption name UCI_Chess960 value true",
    "bqnb1rkr/pp3ppp/3ppn2/2p5/5P2/P2P4/NPP1P1PP/BQ1BNRKR w HFhf - 2 9 moves g2g3 d6d5",
    "setoption name UCI_Chess960 value false",
];

/// Build the bench script from `[hash] [threads] [limit] [fenFile] [limitType]`.
///
/// `fenFile` is `default`, `current` (`current_fen`) or a path with one FEN
/// per line; lines containing `setoption` are passed through as commands.
/// `limitType` is a `go` keyword (`depth`, `nodes`, `movetime`, `perft`, ...)
/// or `eval`.
pub fn setup_bench(args: &[String], current_fen: &str) -> Result<Vec<String>> {
    let arg = |i: usize, default: &'static str| args.get(i).map_or(default, String::as_str);
    let hash = arg(0, "16");
    let threads = arg(1, "1");
    let limit = arg(2, "8");
    let fen_file = arg(3, "default");
    let limit_type = arg(4, "depth");

    let go = if limit_type == "eval" {
        "eval".to_string()
    } else {
        format!("go {limit_type} {limit}")
    };

    let fens: Vec<String> = match fen_file {
        "default" => DEFAULT_POSITIONS.iter().map(|s| s.to_string()).collect(),
        "current" => vec![current_fen.to_string()],
        path => fs::read_to_string(path)
            .map_err(|source| UciError::BenchFile {
                path: path.to_string(),
                source,
            })?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    };

    let mut list = vec![
        format!("setoption name Threads value {threads}"),
        format!("setoption name Hash value {hash}"),
        "ucinewgame".to_string(),
    ];
    for fen in fens {
        if fen.contains("setoption") {
            list.push(fen);
        } else {
            list.push(format!("position fen {fen}"));
            list.push(go.clone());
        }
    }
    Ok(list)
}

/// Run the script, blocking on every search
pub fn run(uci: &mut Uci, args: &[String]) {
    let current_fen = uci.session().position().to_fen();
    let list = match setup_bench(args, &current_fen) {
        Ok(list) => list,
        Err(e) => {
            warn!("bench: {e}");
            uci.out().info_string(e.to_string());
            return;
        }
    };

    let total = list
        .iter()
        .filter(|c| c.starts_with("go ") || c.starts_with("eval"))
        .count();
    let mut count = 1;
    let mut nodes: u64 = 0;
    let mut start = Instant::now();

    for line in &list {
        match parse_command(line) {
            Command::Go(params) => {
                uci.out().eprintln(&format!("\nPosition: {count}/{total}"));
                count += 1;

                let lap = Instant::now();
                uci.go(params);
                uci.session().wait_for_search_finished();
                let lap_nodes = uci.session().nodes_searched();
                nodes += lap_nodes;
                let lap_ms = elapsed_ms(lap);
                uci.out()
                    .eprintln(&format!("Nodes/Second: {}", nodes_per_second(lap_nodes, lap_ms)));
            }
            Command::Eval => {
                uci.out().eprintln(&format!("\nPosition: {count}/{total}"));
                count += 1;
                uci.out()
                    .println(&format!("\n{}", eval::trace(uci.session().position())));
            }
            Command::UciNewGame => {
                uci.dispatch(Command::UciNewGame);
                start = Instant::now();
            }
            command @ (Command::SetOption { .. }
            | Command::Set { .. }
            | Command::Position { .. }) => {
                uci.dispatch(command);
            }
            other => debug!("bench: skipping {other:?}"),
        }
    }

    let total_ms = elapsed_ms(start);
    uci.out().eprintln(&format!(
        "\n=================================\n\
         Total time (ms) : {total_ms}\n\
         Nodes searched  : {nodes}"
    ));
    uci.out()
        .eprintln(&format!("\nNodes/second    : {}", nodes_per_second(nodes, total_ms)));
}

/// Milliseconds since `since`, plus one so it can be divided by
fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64 + 1
}

fn nodes_per_second(nodes: u64, ms: u64) -> String {
    let nps = nodes.saturating_mul(1000) / ms;
    if nps < NPS_DISPLAY_LIMIT {
        nps.to_string()
    } else {
        format!("{}k", nodes / ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SyncOut;
    use rhoney_core::START_FEN;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_script() {
        let list = setup_bench(&[], START_FEN).unwrap();
        assert_eq!(list[0], "setoption name Threads value 1");
        assert_eq!(list[1], "setoption name Hash value 16");
        assert_eq!(list[2], "ucinewgame");
        assert_eq!(list[3], format!("position fen {START_FEN}"));
        assert_eq!(list[4], "go depth 8");
        assert!(list.contains(&"setoption name UCI_Chess960 value true".to_string()));

        let positions = DEFAULT_POSITIONS.iter().filter(|f| !f.contains("setoption")).count();
        assert_eq!(list.iter().filter(|c| c.starts_with("go ")).count(), positions);
    }

    #[test]
    fn test_custom_arguments() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let list = setup_bench(&args(&["64", "2", "1000", "current", "nodes"]), fen).unwrap();
        assert_eq!(
            list,
            vec![
                "setoption name Threads value 2",
                "setoption name Hash value 64",
                "ucinewgame",
                "position fen 4k3/8/8/8/8/8/8/4K2R w K - 0 1",
                "go nodes 1000",
            ]
        );

        let list = setup_bench(&args(&["16", "1", "1", "current", "eval"]), fen).unwrap();
        assert_eq!(list.last().map(String::as_str), Some("eval"));
    }

    #[test]
    fn test_missing_fen_file() {
        let err = setup_bench(&args(&["16", "1", "1", "/nonexistent/bench.fen"]), START_FEN)
            .unwrap_err();
        assert!(matches!(err, UciError::BenchFile { .. }));
        assert!(err.to_string().starts_with("unable to open file /nonexistent/bench.fen"));
    }

    #[test]
    fn test_nodes_per_second_switches_to_k() {
        assert_eq!(nodes_per_second(5_000, 100), "50000");
        assert_eq!(nodes_per_second(0, 1), "0");
        assert_eq!(nodes_per_second(20_000_000, 1_000), "20000k");
        assert_eq!(nodes_per_second(9_999_999, 1_000), "9999999");
    }

    #[test]
    fn test_bench_totals_match_laps() {
        let (out, stdout, stderr) = SyncOut::capture();
        let mut uci = Uci::new(out);
        uci.execute("bench 16 1 2 current perft");

        let err = stderr.contents();
        assert!(err.contains("Position: 1/1"));
        assert!(err.contains("Nodes searched  : 400"));
        assert!(err.contains("Nodes/second    : "));
        assert!(stdout.contents().contains("Nodes searched: 400"));
    }
}
