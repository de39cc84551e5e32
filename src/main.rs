//! Gallop CLI
//!
//! Pace figure analysis, speed tables and post-position summaries from
//! past-performance and result-chart exports.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            field,
            charts,
            analysis,
            format,
        } => cli::run_analyze(field, charts, analysis, format),
        Commands::Figures {
            field,
            dirt_sprints,
            analysis,
            format,
        } => cli::run_figures(field, dirt_sprints, analysis, format),
        Commands::Speed { charts, format } => cli::run_speed(charts, format),
        Commands::PostPositions { charts, format } => cli::run_post_positions(charts, format),
    }
}
