//! Encrypted archive access
//!
//! Reads the prompt entry from an inbound archive and writes the reply as a
//! single-entry archive. Archives use Deflate compression and WinZip AES-256
//! encryption under the shared password. These are blocking calls.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{AesMode, CompressionMethod, ZipArchive, ZipWriter};

use super::ExchangeError;

/// Name of the prompt entry in inbound archives
pub const INPUT_ENTRY: &str = "input.txt";

/// Name of the reply entry in outbound archives
pub const OUTPUT_ENTRY: &str = "output.txt";

fn access_error(e: ZipError) -> ExchangeError {
    match e {
        ZipError::InvalidPassword => ExchangeError::ArchiveAccess("invalid password".to_string()),
        other => ExchangeError::ArchiveAccess(other.to_string()),
    }
}

/// Read one entry from a password-protected archive
///
/// # Errors
/// * `ArchiveAccess` if the container is malformed or the password is wrong
/// * `MissingEntry` if `entry_name` is not in the archive
/// * `EntryTooLarge` if the entry's uncompressed size exceeds `max_bytes`
pub fn read_entry(
    path: &Path,
    entry_name: &str,
    password: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExchangeError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(access_error)?;

    if archive.index_for_name(entry_name).is_none() {
        return Err(ExchangeError::MissingEntry(entry_name.to_string()));
    }

    let entry = archive
        .by_name_decrypt(entry_name, password.as_bytes())
        .map_err(access_error)?;

    if entry.size() > max_bytes {
        return Err(ExchangeError::EntryTooLarge {
            size: entry.size(),
            limit: max_bytes,
        });
    }

    // The declared size can lie; never read past the limit.
    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry
        .take(max_bytes + 1)
        .read_to_end(&mut contents)
        .map_err(|e| ExchangeError::ArchiveAccess(e.to_string()))?;

    if contents.len() as u64 > max_bytes {
        return Err(ExchangeError::EntryTooLarge {
            size: contents.len() as u64,
            limit: max_bytes,
        });
    }

    Ok(contents)
}

/// Read and validate the prompt from an inbound archive
///
/// Decodes `input.txt` as UTF-8 and trims surrounding whitespace.
///
/// # Errors
/// Everything `read_entry` returns, plus `InvalidEncoding` and `EmptyInput`.
pub fn read_prompt(path: &Path, password: &str, max_bytes: u64) -> Result<String, ExchangeError> {
    let bytes = read_entry(path, INPUT_ENTRY, password, max_bytes)?;
    let text = String::from_utf8(bytes).map_err(|_| ExchangeError::InvalidEncoding)?;

    let prompt = text.trim();
    if prompt.is_empty() {
        return Err(ExchangeError::EmptyInput);
    }
    Ok(prompt.to_string())
}

/// Write `contents` as the only entry of a new encrypted archive at `path`
pub fn write_entry(
    path: &Path,
    entry_name: &str,
    contents: &[u8],
    password: &str,
) -> Result<(), ExchangeError> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);

    let options = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .with_aes_encryption(AesMode::Aes256, password);

    writer
        .start_file(entry_name, options)
        .map_err(io::Error::from)?;
    writer.write_all(contents)?;
    writer.finish().map_err(io::Error::from)?;
    Ok(())
}

/// Write the reply as `output.txt` in a new encrypted archive
pub fn write_reply(path: &Path, reply: &str, password: &str) -> Result<(), ExchangeError> {
    write_entry(path, OUTPUT_ENTRY, reply.as_bytes(), password)
}
