use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = match_ticketing_cli::Cli::parse();
    match_ticketing_cli::run_cli(cli)
}
