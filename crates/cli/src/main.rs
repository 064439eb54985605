use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "loupe")]
#[command(about = "Search text documents from the command line", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print every match in a file
    Scan(ScanArgs),

    /// Print the number of matches in a file
    Count(QueryArgs),

    /// Render a minimap-style overview of match locations
    Overview(OverviewArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// File to search
    file: PathBuf,

    /// Pattern to search for
    pattern: String,

    /// Interpret the pattern as a regular expression
    #[arg(long)]
    regex: bool,

    /// Match case-insensitively
    #[arg(long, short = 'i')]
    ignore_case: bool,

    /// Stop collecting after this many matches
    #[arg(long)]
    max_results: Option<u32>,
}

#[derive(Args)]
struct ScanArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Emit matches as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct OverviewArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Number of buckets in the overview
    #[arg(long, default_value_t = 60)]
    buckets: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.action {
        Action::Scan(args) => commands::scan::run(&args),
        Action::Count(args) => commands::count::run(&args),
        Action::Overview(args) => commands::overview::run(&args),
    }
}
