//! Exchange-specific error types
//!
//! Errors that can occur while unpacking a prompt archive, calling the
//! completion API, or packing the reply.

use thiserror::Error;

/// Errors that can occur during one exchange
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Wrong password or a malformed archive container
    #[error("Cannot open archive: {0}")]
    ArchiveAccess(String),

    /// The required prompt entry is not in the archive
    #[error("{0} not found in ZIP")]
    MissingEntry(String),

    /// The prompt is blank after trimming
    #[error("Prompt is empty")]
    EmptyInput,

    /// The prompt entry is not valid UTF-8
    #[error("Prompt is not valid UTF-8 text")]
    InvalidEncoding,

    /// The prompt entry exceeds the configured limit
    #[error("Prompt entry is {size} bytes, limit is {limit} bytes")]
    EntryTooLarge {
        /// Declared uncompressed size
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// The completion API answered with a non-success status
    #[error("OpenAI Error (HTTP {status}): {body}")]
    Upstream {
        /// Upstream HTTP status code
        status: u16,
        /// Upstream response body, verbatim
        body: String,
    },

    /// The completion API could not be reached
    #[error("Failed to reach completion API: {0}")]
    UpstreamUnreachable(#[from] reqwest::Error),

    /// The completion API answered 200 with an unexpected payload
    #[error("Unexpected completion API response: {0}")]
    MalformedUpstreamResponse(String),

    /// Scratch storage could not be created, written or read
    #[error("Scratch storage error: {0}")]
    Scratch(#[from] std::io::Error),
}

impl ExchangeError {
    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExchangeError::ArchiveAccess(_)
                | ExchangeError::MissingEntry(_)
                | ExchangeError::EmptyInput
                | ExchangeError::InvalidEncoding
                | ExchangeError::EntryTooLarge { .. }
        )
    }
}
