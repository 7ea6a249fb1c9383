use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::analyze::AnalyzeArgs;

#[derive(Parser)]
#[command(name = "sentiment-edge")]
#[command(about = "Significance tests for PnL grouped by sentiment classification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the grouped significance analysis on a prepared CSV
    Analyze {
        /// Input CSV with one row per observation
        #[arg(short, long)]
        input: String,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Column holding the group label
        #[arg(long, default_value = "classification")]
        group_column: String,
        /// Column holding the numeric observation
        #[arg(long, default_value = "total_pnl")]
        value_column: String,
        /// Number of permutations per test
        #[arg(long, default_value_t = 5000)]
        permutations: usize,
        /// Seed for the permutation RNG
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Skip the rank-based test and always use the permutation fallback
        #[arg(long)]
        no_parametric: bool,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            group_column,
            value_column,
            permutations,
            seed,
            no_parametric,
            json,
        } => commands::analyze::run(&AnalyzeArgs {
            input,
            output,
            group_column,
            value_column,
            permutations,
            seed,
            no_parametric,
            json,
        }),
    }
}
