mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match platform::run_app(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("daily-publisher: {err:#}");
            ExitCode::FAILURE
        }
    }
}
