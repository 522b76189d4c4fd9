//! zipgpt Backend Library
//!
//! Relays prompts packed in encrypted ZIP archives to a chat-completion API
//! and packs the replies the same way. The service binary is in `src/main.rs`;
//! the batch and sealing utilities live in `src/bin/`.

pub mod api;
pub mod batch;
pub mod completion;
pub mod config;
pub mod error;
/// Archive-in, archive-out exchange pipeline
pub mod exchange;
