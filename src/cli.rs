use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::models::View;

#[derive(Parser)]
#[command(name = "market-overview")]
#[command(about = "World market overview: prices, historical returns, cross rates and top movers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one batch and print the market overview
    Overview {
        /// Which configured view to show
        #[arg(short, long, value_enum, default_value_t = View::Detail)]
        view: View,

        /// Skip the individual stock movers
        #[arg(long)]
        no_movers: bool,

        /// Skip valuation fields (52-week range, P/E, analyst rating)
        #[arg(long)]
        no_fundamentals: bool,

        /// Print JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Market configuration file (JSON); defaults to $MARKET_CONFIG or built-in
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective market configuration as JSON
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the historical windows
    Windows {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Overview {
            view,
            no_movers,
            no_fundamentals,
            json,
            config,
        } => {
            commands::overview::run(view, !no_movers, !no_fundamentals, json, config);
        }
        Commands::Config { config } => {
            commands::config::run(config);
        }
        Commands::Windows { config } => {
            commands::windows::run(config);
        }
    }
}
