mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::freeze::CompareFreezeArgs;
use commands::simulate::{RunArgs, SummaryArgs, TraceArgs};

/// Monte Carlo risk engine for warehoused, tranched debt portfolios
#[derive(Parser)]
#[command(
    name = "wre",
    version,
    about = "Monte Carlo risk engine for warehoused, tranched debt portfolios",
    long_about = "Simulates correlated credit and margin drivers, runs each path through \
                  an amortizing tranche waterfall or a bullet-maturity funding-freeze \
                  model, and reports the distribution of total net income."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and return the full result table with its summary
    Run(RunArgs),
    /// Run the simulation and return only the summary KPIs
    Summary(SummaryArgs),
    /// Compare the regime-switching model with the funding freeze on and off
    CompareFreeze(CompareFreezeArgs),
    /// Month-by-month funding layers of one amortizing path
    Trace(TraceArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::simulate::run_run(args),
        Commands::Summary(args) => commands::simulate::run_summary(args),
        Commands::CompareFreeze(args) => commands::freeze::run_compare_freeze(args),
        Commands::Trace(args) => commands::simulate::run_trace(args),
        Commands::Version => {
            println!("wre {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
