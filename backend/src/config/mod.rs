//! Application configuration
//!
//! Centralized configuration management. Values come from a sealed dotenv
//! file (when `ENV_SECRET_PASSWORD` is set) layered over the process
//! environment, with sensible defaults for everything except the two secrets.
//! The resulting `Config` is built once at startup and shared read-only.

pub mod sealed_env;

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Env var holding the secret that unlocks the sealed dotenv file
pub const SECRET_ENV_VAR: &str = "ENV_SECRET_PASSWORD";

/// Default location of the sealed dotenv file
pub const DEFAULT_SEALED_PATH: &str = ".env.enc";

/// Default chat-completions base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default upper bound for an uploaded archive (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default upper bound for the decompressed prompt entry (1 MiB)
pub const DEFAULT_MAX_PROMPT_BYTES: u64 = 1024 * 1024;

/// Errors raised while building the configuration
///
/// All of these are startup-fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `ENV_SECRET_PASSWORD` was required but not set
    #[error("ENV_SECRET_PASSWORD is not set")]
    MissingSecret,

    /// A required value is absent from both the sealed file and the environment
    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),

    /// A value is present but cannot be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending raw value
        value: String,
    },

    /// The sealed file could not be read
    #[error("Failed to read sealed env file {}: {source}", .path.display())]
    SealedFile {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The sealed file could not be decrypted
    #[error("Failed to decrypt sealed env file: {0}")]
    Decrypt(String),

    /// The decrypted content is not valid dotenv syntax
    #[error("Failed to parse decrypted env file: {0}")]
    Parse(String),

    /// A plaintext `.env` exists but cannot be loaded
    #[error("Failed to load .env file: {0}")]
    DotenvFile(String),
}

/// Application configuration
#[derive(Debug)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Completion API configuration
    pub completion: CompletionConfig,
    /// Archive handling configuration
    pub archive: ArchiveConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

/// Completion API configuration
#[derive(Debug)]
pub struct CompletionConfig {
    /// Bearer credential
    pub api_key: SecretString,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Optional request timeout; `None` keeps the HTTP client default
    pub timeout_secs: Option<u64>,
}

/// Archive handling configuration
#[derive(Debug)]
pub struct ArchiveConfig {
    /// Shared password for inbound and outbound archives
    pub password: SecretString,
    /// Largest accepted prompt entry (uncompressed), in bytes
    pub max_prompt_bytes: u64,
    /// Parent directory for per-exchange scratch areas
    pub scratch_dir: PathBuf,
}

impl Config {
    /// Load configuration for service mode
    ///
    /// Reads `.env` if present. When `ENV_SECRET_PASSWORD` is set, the sealed
    /// file is decrypted and its values take precedence over the environment.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv_file(Path::new(".env"))?;
        let secret = env::var(SECRET_ENV_VAR).ok();
        Self::load_with(secret.as_deref(), &sealed_path(), |key| env::var(key).ok())
    }

    /// Service-mode loading with explicit inputs
    ///
    /// Without a secret, values come from `env_lookup` alone.
    pub fn load_with<F>(
        secret: Option<&str>,
        sealed_path: &Path,
        env_lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sealed = match secret {
            Some(secret) => sealed_env::load(sealed_path, secret)?,
            None => HashMap::new(),
        };
        Self::from_layers(&sealed, env_lookup)
    }

    /// Load configuration for batch mode
    ///
    /// Unlike `load`, the secret is mandatory and the sealed file must decrypt.
    pub fn load_sealed() -> Result<Self, ConfigError> {
        let secret = env::var(SECRET_ENV_VAR).ok();
        Self::load_sealed_with(secret.as_deref(), &sealed_path(), |key| env::var(key).ok())
    }

    /// Batch-mode loading with explicit inputs
    pub fn load_sealed_with<F>(
        secret: Option<&str>,
        sealed_path: &Path,
        env_lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;
        let sealed = sealed_env::load(sealed_path, secret)?;
        Self::from_layers(&sealed, env_lookup)
    }

    fn from_layers<F>(sealed: &HashMap<String, String>, env_lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| sealed.get(key).cloned().or_else(|| env_lookup(key)))
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingValue(key))
        };
        let parsed = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidValue { key, value: v })
                })
                .transpose()
        };

        let api_key = SecretString::new(required("OPENAI_API_KEY")?);
        let password = SecretString::new(required("ZIP_PASSWORD")?);

        let port = match parsed("PORT")? {
            Some(p) => u16::try_from(p).map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: p.to_string(),
            })?,
            None => 10000,
        };

        Ok(Self {
            server: ServerConfig {
                port,
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                max_upload_bytes: parsed("MAX_UPLOAD_BYTES")?
                    .map(|v| {
                        usize::try_from(v).map_err(|_| ConfigError::InvalidValue {
                            key: "MAX_UPLOAD_BYTES",
                            value: v.to_string(),
                        })
                    })
                    .transpose()?
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            completion: CompletionConfig {
                api_key,
                base_url: lookup("OPENAI_API_BASE")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout_secs: parsed("OPENAI_TIMEOUT_SECS")?,
            },
            archive: ArchiveConfig {
                password,
                max_prompt_bytes: parsed("MAX_PROMPT_BYTES")?.unwrap_or(DEFAULT_MAX_PROMPT_BYTES),
                scratch_dir: lookup("SCRATCH_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(env::temp_dir),
            },
        })
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load a plaintext `.env` into the process environment
///
/// A missing file is fine; a malformed one is fatal.
fn load_dotenv_file(path: &Path) -> Result<(), ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::DotenvFile(e.to_string())),
    }
}

fn sealed_path() -> PathBuf {
    env::var("ENV_SEALED_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SEALED_PATH))
}
