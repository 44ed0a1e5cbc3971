use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cryptorank::scraping::Source;

pub mod formatters;
pub mod runner;

#[derive(Parser)]
#[command(name = "cryptorank")]
#[command(
    version,
    about = "Scrape CoinGecko and CoinMarketCap trend rankings into a key-value table"
)]
#[command(
    long_about = "Drives a headless browser to load each site's trending table, extracts one record per row, and writes the records to DynamoDB (or a local SQLite store). Configuration is read from the environment or a .env file."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape trend rankings and write them to the configured table
    Scrape {
        /// Which source to scrape
        #[arg(value_enum)]
        target: ScrapeSelection,
    },

    /// Run a source's extractor on a saved HTML page (no browser, no storage)
    Parse {
        /// Layout to extract with
        #[arg(value_enum)]
        source: Source,

        /// Path to the saved, rendered HTML page
        file: PathBuf,
    },

    /// Delete a table and all of its items
    DeleteTable {
        /// Table name
        name: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show the effective column layouts
    Layouts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScrapeSelection {
    Coingecko,
    Coinmarketcap,
    All,
}

impl ScrapeSelection {
    pub fn sources(&self) -> Vec<Source> {
        match self {
            ScrapeSelection::Coingecko => vec![Source::CoinGecko],
            ScrapeSelection::Coinmarketcap => vec![Source::CoinMarketCap],
            ScrapeSelection::All => Source::ALL.to_vec(),
        }
    }
}
