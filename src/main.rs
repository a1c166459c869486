mod cli;
mod commands;
mod dimensions;
mod model;
mod queries;
mod store;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit(args) => commands::submit::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Runs(args) => commands::runs::run(args),
        Commands::Catalog(args) => commands::catalog::run(args),
        Commands::Trend(args) => commands::trend::run(args),
        Commands::Pivot(args) => commands::pivot::run(args),
        Commands::Series(args) => commands::series::run(args),
        Commands::Compare(args) => commands::compare::run(args),
        Commands::Dimensions(args) => commands::dimensions::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Delete(args) => commands::delete::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
