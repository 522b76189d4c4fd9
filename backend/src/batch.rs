//! Batch mode
//!
//! Runs a single exchange from a local archive to a local archive, without
//! the HTTP layer. Used by the `zipgpt-batch` binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigError;
use crate::exchange::{ExchangeError, ExchangeHandler};

/// Fixed input archive path, relative to the working directory
pub const BATCH_INPUT: &str = "input.zip";

/// Fixed output archive path, relative to the working directory
pub const BATCH_OUTPUT: &str = "output.zip";

/// Errors that end a batch run
#[derive(Error, Debug)]
pub enum BatchError {
    /// Configuration could not be loaded or decrypted
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be initialized
    #[error("Failed to initialize HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The input archive does not exist
    #[error("Input archive not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// The exchange failed
    #[error("{0}")]
    Exchange(#[from] ExchangeError),

    /// The output archive could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    Output {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Run one exchange from `input` to `output`
///
/// The output is staged next to its destination and renamed into place only
/// once complete; on failure no `output` file is created.
///
/// Returns the size of the written archive.
pub async fn run(
    handler: &ExchangeHandler,
    input: &Path,
    output: &Path,
) -> Result<usize, BatchError> {
    if !input.is_file() {
        return Err(BatchError::MissingInput(input.to_path_buf()));
    }

    let reply = handler.run_file(input).await?;

    let output_error = |source: std::io::Error| BatchError::Output {
        path: output.to_path_buf(),
        source,
    };
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = tempfile::NamedTempFile::new_in(parent).map_err(output_error)?;
    staged.write_all(&reply).map_err(output_error)?;
    staged
        .persist(output)
        .map_err(|e| output_error(e.error))?;

    Ok(reply.len())
}
