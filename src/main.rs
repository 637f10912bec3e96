use std::process::ExitCode;

use clap::Parser;
use contract_router::cli::{run_cli, Cli};
use contract_router::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: {e:#}");
    }
    match run_cli(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
