//! Seal a dotenv file into the encrypted `.env.enc` format
//!
//! Usage: `ENV_SECRET_PASSWORD=... seal-env [.env] [.env.enc]`
//!
//! The output is compatible with
//! `openssl enc -aes-256-cbc -pbkdf2 -d -in .env.enc -pass pass:...`.

use std::env;
use std::process::ExitCode;
use zeroize::Zeroizing;
use zipgpt_backend::config::{sealed_env, DEFAULT_SEALED_PATH, SECRET_ENV_VAR};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| ".env".to_string());
    let output = args.next().unwrap_or_else(|| DEFAULT_SEALED_PATH.to_string());

    let Ok(secret) = env::var(SECRET_ENV_VAR) else {
        eprintln!("✗ {} is not set", SECRET_ENV_VAR);
        return ExitCode::FAILURE;
    };

    let plaintext = match std::fs::read(&input) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(e) => {
            eprintln!("✗ Failed to read {}: {}", input, e);
            return ExitCode::FAILURE;
        }
    };

    // Refuse to seal something the loader could not parse back
    if let Err(e) = sealed_env::parse_dotenv(&plaintext) {
        eprintln!("✗ {} is not a valid env file: {}", input, e);
        return ExitCode::FAILURE;
    }

    let blob = sealed_env::seal(&plaintext, &secret);
    if let Err(e) = std::fs::write(&output, blob) {
        eprintln!("✗ Failed to write {}: {}", output, e);
        return ExitCode::FAILURE;
    }

    println!("✓ Sealed {} -> {}", input, output);
    ExitCode::SUCCESS
}
