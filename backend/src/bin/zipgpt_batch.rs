//! Batch runner: `input.zip` in the working directory -> `output.zip`
//!
//! Requires `ENV_SECRET_PASSWORD` to unlock `.env.enc`. Exits with status 1
//! on any failure.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use zipgpt_backend::batch::{self, BatchError, BATCH_INPUT, BATCH_OUTPUT};
use zipgpt_backend::config::Config;
use zipgpt_backend::exchange::ExchangeHandler;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("   ✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BatchError> {
    println!("1. Decrypting configuration...");
    let config = Arc::new(Config::load_sealed()?);
    println!("   ✓ Configuration loaded (model: {})", config.completion.model);

    let handler = ExchangeHandler::new(config)?;

    println!("\n2. Running exchange {} -> {}...", BATCH_INPUT, BATCH_OUTPUT);
    let written = batch::run(&handler, Path::new(BATCH_INPUT), Path::new(BATCH_OUTPUT)).await?;
    println!("   ✓ Wrote {} ({} bytes)", BATCH_OUTPUT, written);

    println!("\n✓ Done!");
    Ok(())
}
