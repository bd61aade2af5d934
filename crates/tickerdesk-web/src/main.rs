use std::process::ExitCode;

use clap::Parser;
use tickerdesk_web::{ServerConfig, ServerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();

    if let Err(error) = init_tracing(&config.log_filter) {
        eprintln!("error: {error}");
        return ExitCode::from(error.exit_code());
    }

    match tickerdesk_web::serve(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "tickerdesk failed");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing(filter: &str) -> Result<(), ServerError> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|error| ServerError::Config(format!("log filter '{filter}': {error}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|error| ServerError::Config(error.to_string()))
}
