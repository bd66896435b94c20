pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use unikron_core::domain::selection::DEFAULT_STYLE_ID;

#[derive(Debug, Parser)]
#[command(
    name = "unikron",
    about = "Unikron studio operator CLI",
    long_about = "Price studio selections against the inventory catalog, inspect configuration, and check external collaborators.",
    after_help = "Examples:\n  unikron quote --style luxe --addon smart_home --tier complex --area 150\n  unikron catalog\n  unikron doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute the total and line items for one selection")]
    Quote(QuoteArgs),
    #[command(about = "Validate the inventory catalog and summarize its contents")]
    Catalog {
        #[arg(long, help = "Catalog file to load instead of the configured one")]
        catalog: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and catalog, then probe the render, LLM and payment services")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Clone, Debug, Args)]
pub struct QuoteArgs {
    #[arg(long, default_value = DEFAULT_STYLE_ID, help = "Style id from the catalog")]
    pub style: String,
    #[arg(long = "addon", help = "Add-on id; repeat for several")]
    pub addons: Vec<String>,
    #[arg(long, help = "Complexity tier key (unknown tiers price at 1x)")]
    pub tier: Option<String>,
    #[arg(long, help = "Project area in square meters")]
    pub area: Option<Decimal>,
    #[arg(long, help = "Catalog file to load instead of the configured one")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl QuoteArgs {
    pub fn for_style(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            addons: Vec::new(),
            tier: None,
            area: None,
            catalog: None,
            json: false,
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote(args) => commands::quote::run(&args),
        Command::Catalog { catalog } => commands::catalog::run(catalog),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
