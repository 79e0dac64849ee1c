use std::io;

use anyhow::Result;
use clap::Parser;
use log::info;
use rhoney_core::misc;
use rhoney_uci::{SyncOut, Uci};

#[derive(Parser, Debug)]
#[command(name = "rhoney", version)]
#[command(about = "UCI chess engine; reads commands from stdin or runs the one given")]
struct Cli {
    /// Run this single command and exit (e.g. `bench 16 1 10`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let out = SyncOut::stdio();
    out.println(&misc::engine_info(false));

    let mut uci = Uci::new(out);
    if cli.command.is_empty() {
        uci.run(io::stdin().lock())?;
    } else {
        let line = cli.command.join(" ");
        info!("one-shot command: {line}");
        uci.run_once(&line);
    }
    Ok(())
}
