mod cli;

use clap::Parser;
use cli::Cli;
use cryptorank::error::ScrapeError;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!std::env::args().any(|a| a == "--no-color"))
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    cryptorank::config::load_dotenv();

    match cli::runner::run(cli.command, cli.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<ScrapeError>()
                .map(ScrapeError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
