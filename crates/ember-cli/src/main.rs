//! Ember CLI - Headless driver for the Ember demo engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{run, validate};

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Headless driver for the Ember fire-effect demos", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation headless and report diagnostics
    Run {
        /// Path to a TOML config (defaults apply when omitted)
        #[arg(long)]
        config: Option<String>,

        /// Number of fixed 60 Hz ticks to simulate
        #[arg(long, default_value = "600")]
        ticks: u64,

        /// RNG seed for reproducible runs
        #[arg(long, default_value = "1")]
        seed: u32,

        /// Landing path: "decay" or "egg"
        #[arg(long, default_value = "decay")]
        variant: String,

        /// Issue a scripted click on a decaying particle every N ticks
        #[arg(long)]
        click_every: Option<u64>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Parse and validate a config file
    Validate {
        /// Path to a TOML config
        config: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            variant,
            click_every,
            format,
        } => run::run(run::RunArgs {
            config,
            ticks,
            seed,
            variant,
            click_every,
            format,
        }),
        Commands::Validate { config } => validate::run(&config),
    }
}
