mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::comparison::CompareArgs;
use commands::products::{BasisrenteArgs, EtfArgs, PrivatrenteArgs, RiesterArgs};
use commands::tax::MarginalRateArgs;

/// Net future value of German retirement-savings products
#[derive(Parser)]
#[command(
    name = "vorsorge",
    version,
    about = "Net future value of German retirement-savings products",
    long_about = "Projects ETF savings plans, Basisrente, Riester and private pension \
                  insurance over a savings horizon with decimal precision, applying \
                  costs, subsidies and German tax rules, and ranks them by net value."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Statutory rule overrides (.yaml/.yml or .json); unset fields keep their defaults
    #[arg(long, global = true)]
    rules: Option<String>,

    /// Log calculation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project an ETF savings plan
    Etf(EtfArgs),
    /// Project a Basisrente (Rürup) contract
    Basisrente(BasisrenteArgs),
    /// Project a Riester pension contract
    Riester(RiesterArgs),
    /// Project a private pension insurance
    Privatrente(PrivatrenteArgs),
    /// Compare the selected products and recommend one
    Compare(CompareArgs),
    /// Marginal income-tax rate for a taxable income
    MarginalRate(MarginalRateArgs),
    /// Print the statutory rules in effect
    Rules,
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
    logging::init_logger(cli.verbose);

    if let Commands::Version = cli.command {
        println!("vorsorge {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let rules = match input::file::read_rules(cli.rules.as_deref()) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Etf(args) => commands::products::run_etf(args, &rules),
        Commands::Basisrente(args) => commands::products::run_basisrente(args, &rules),
        Commands::Riester(args) => commands::products::run_riester(args, &rules),
        Commands::Privatrente(args) => commands::products::run_privatrente(args, &rules),
        Commands::Compare(args) => commands::comparison::run_compare(args, &rules),
        Commands::MarginalRate(args) => commands::tax::run_marginal_rate(args, &rules),
        Commands::Rules => commands::tax::run_rules(&rules),
        Commands::Version => return,
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
