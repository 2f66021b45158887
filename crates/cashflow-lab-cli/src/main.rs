mod commands;
mod input;
mod output;
mod templates;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::compare::CompareArgs;
use commands::export::ExportArgs;
use commands::growth::GrowthArgs;
use commands::project::ProjectArgs;
use commands::templates::TemplatesArgs;

/// Monthly cash flow projections with working capital and debt service
#[derive(Parser)]
#[command(
    name = "cfl",
    version,
    about = "Monthly cash flow and working capital projections",
    long_about = "A CLI for projecting business cash flow month by month with decimal \
                  precision. Models compounding growth, working-capital consumption, \
                  amortizing debt service, scenario comparison, and sustainable-growth \
                  analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project monthly cash flow from a baseline parameter set
    Project(ProjectArgs),
    /// Compare working-capital scenarios against the base case
    Compare(CompareArgs),
    /// Find the fastest growth the cash balance can sustain
    Growth(GrowthArgs),
    /// Write every scenario's month series to a CSV file
    Export(ExportArgs),
    /// List the built-in business templates
    Templates(TemplatesArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Growth(args) => commands::growth::run_growth(args),
        Commands::Export(args) => commands::export::run_export(args),
        Commands::Templates(args) => commands::templates::run_templates(args),
        Commands::Version => {
            println!("cfl {}", env!("CARGO_PKG_VERSION"));
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
