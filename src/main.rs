//! Conformance CLI for a schema-drifting HTTP JSON gateway
//!
//! Runs ordered scenario groups of dependent API calls, validates every
//! response against the envelope shapes the gateway has shipped over
//! time, and leaves full request/response artifacts behind.

use clap::Parser;
use conform::commands::Commands;
use conform::{cli, common};

#[derive(Parser)]
#[command(name = "conform", about = "Gateway API conformance harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Run { verbose: true, .. });
    common::logging::init_cli(verbose);

    match cli::dispatch(cli.command).await {
        Ok(exit_status) => std::process::exit(exit_status),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
