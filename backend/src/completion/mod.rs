//! Chat-completion API client
//!
//! Typed client for the OpenAI-compatible `/chat/completions` endpoint.

pub mod client;
pub mod types;

pub use client::CompletionClient;
