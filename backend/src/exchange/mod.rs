//! Exchange handling
//!
//! One exchange = unpack the prompt from an encrypted archive, ask the
//! completion API, pack the reply into a new encrypted archive.
//!
//! Every exchange works inside its own scratch directory (a `TempDir` under
//! the configured scratch root). The directory is removed when the exchange
//! returns, whether it succeeded or not, so concurrent exchanges never see
//! each other's files and nothing outlives the call.

pub mod archive;
pub mod error;

pub use error::ExchangeError;

use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::completion::CompletionClient;
use crate::config::Config;

/// File name the inbound archive is staged under
const STAGED_INPUT: &str = "input.zip";

/// File name the reply archive is built under
const STAGED_OUTPUT: &str = "output.zip";

/// Runs exchanges against a shared configuration and completion client
pub struct ExchangeHandler {
    config: Arc<Config>,
    completion: CompletionClient,
}

impl ExchangeHandler {
    /// Create a handler for the given configuration
    ///
    /// # Errors
    /// * Returns the `reqwest` error if the HTTP client cannot be built
    pub fn new(config: Arc<Config>) -> reqwest::Result<Self> {
        let completion = CompletionClient::new(&config.completion)?;
        Ok(Self { config, completion })
    }

    /// Shared configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one exchange on an inbound archive held in memory
    ///
    /// Returns the bytes of the reply archive.
    pub async fn run(&self, archive: &[u8]) -> Result<Vec<u8>, ExchangeError> {
        let scratch = self.acquire_scratch().await?;
        let input_path = scratch.path().join(STAGED_INPUT);
        tokio::fs::write(&input_path, archive).await?;

        let reply_path = self.run_staged(&input_path, scratch.path()).await?;
        let reply = tokio::fs::read(&reply_path).await?;

        scratch.close()?;
        Ok(reply)
    }

    /// Run one exchange reading the inbound archive from `input`
    ///
    /// Returns the bytes of the reply archive.
    pub async fn run_file(&self, input: &Path) -> Result<Vec<u8>, ExchangeError> {
        let scratch = self.acquire_scratch().await?;

        let reply_path = self.run_staged(input, scratch.path()).await?;
        let reply = tokio::fs::read(&reply_path).await?;

        scratch.close()?;
        Ok(reply)
    }

    async fn acquire_scratch(&self) -> Result<TempDir, ExchangeError> {
        let root = self.config.archive.scratch_dir.clone();
        let scratch = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;
            tempfile::Builder::new().prefix("exchange-").tempdir_in(&root)
        })
        .await
        .map_err(join_error)??;
        tracing::debug!(scratch = %scratch.path().display(), "Acquired scratch area");
        Ok(scratch)
    }

    /// Core pipeline; the reply archive is written inside `scratch`
    async fn run_staged(&self, input: &Path, scratch: &Path) -> Result<PathBuf, ExchangeError> {
        let prompt = {
            let config = Arc::clone(&self.config);
            let input = input.to_path_buf();
            tokio::task::spawn_blocking(move || {
                archive::read_prompt(
                    &input,
                    config.archive.password.expose_secret(),
                    config.archive.max_prompt_bytes,
                )
            })
            .await
            .map_err(join_error)??
        };

        tracing::info!(
            prompt_len = prompt.len(),
            model = %self.completion.model(),
            "Prompt extracted, calling completion API"
        );

        let reply = self.completion.complete(&prompt).await?;

        let output = scratch.join(STAGED_OUTPUT);
        {
            let config = Arc::clone(&self.config);
            let output = output.clone();
            tokio::task::spawn_blocking(move || {
                archive::write_reply(&output, &reply, config.archive.password.expose_secret())
            })
            .await
            .map_err(join_error)??;
        }

        tracing::info!("Reply archive written");
        Ok(output)
    }
}

fn join_error(e: tokio::task::JoinError) -> ExchangeError {
    ExchangeError::Scratch(std::io::Error::other(e))
}
