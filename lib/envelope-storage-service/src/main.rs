use std::process::ExitCode;

use clap::Parser;
use envelope_storage_service::{ServeConfig, serve};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServeConfig::parse();
    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server stopped");
            eprintln!("envelope-storage: {}", err);
            ExitCode::FAILURE
        }
    }
}
