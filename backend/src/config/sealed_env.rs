//! Sealed environment files
//!
//! Reads and writes dotenv files encrypted in the format produced by
//! `openssl enc -aes-256-cbc -pbkdf2`, so existing `.env.enc` blobs keep working
//! without shelling out to openssl. Decrypted content only ever lives in memory.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::Sha256;
use std::collections::HashMap;
use zeroize::{Zeroize, Zeroizing};

use super::ConfigError;

/// Magic prefix openssl writes before the salt
pub const SALT_HEADER: &[u8; 8] = b"Salted__";

/// Salt length following the header
const SALT_LEN: usize = 8;

/// openssl's default PBKDF2 iteration count for `-pbkdf2`
const PBKDF2_ROUNDS: u32 = 10_000;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Derive the AES key and IV from the secret the same way openssl does
fn derive_key_iv(secret: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN + IV_LEN]> {
    let mut material = Zeroizing::new([0u8; KEY_LEN + IV_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, PBKDF2_ROUNDS, &mut material[..]);
    material
}

/// Decrypt a sealed blob into its plaintext bytes
///
/// # Errors
/// * `ConfigError::Decrypt` if the header is missing, the secret is wrong,
///   or the ciphertext is truncated.
pub fn open(blob: &[u8], secret: &str) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
    if blob.len() < SALT_HEADER.len() + SALT_LEN || &blob[..SALT_HEADER.len()] != SALT_HEADER {
        return Err(ConfigError::Decrypt(
            "sealed file is missing the 'Salted__' header".to_string(),
        ));
    }

    let salt = &blob[SALT_HEADER.len()..SALT_HEADER.len() + SALT_LEN];
    let ciphertext = &blob[SALT_HEADER.len() + SALT_LEN..];
    let material = derive_key_iv(secret.as_bytes(), salt);

    let decryptor = Aes256CbcDec::new_from_slices(&material[..KEY_LEN], &material[KEY_LEN..])
        .map_err(|e| ConfigError::Decrypt(e.to_string()))?;

    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| ConfigError::Decrypt("bad secret or corrupted sealed file".to_string()))
}

/// Encrypt plaintext into a sealed blob with a fresh random salt
pub fn seal(plaintext: &[u8], secret: &str) -> Vec<u8> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    seal_with_salt(plaintext, secret, &salt)
}

fn seal_with_salt(plaintext: &[u8], secret: &str, salt: &[u8; SALT_LEN]) -> Vec<u8> {
    let material = derive_key_iv(secret.as_bytes(), salt);
    // Key and IV lengths are fixed above, so construction cannot fail.
    let encryptor =
        Aes256CbcEnc::new((&material[..KEY_LEN]).into(), (&material[KEY_LEN..]).into());
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut blob = Vec::with_capacity(SALT_HEADER.len() + SALT_LEN + ciphertext.len());
    blob.extend_from_slice(SALT_HEADER);
    blob.extend_from_slice(salt);
    blob.extend_from_slice(&ciphertext);
    blob
}

/// Parse decrypted dotenv content into key/value pairs
///
/// Uses dotenvy's parser (quotes, comments, `export` prefixes) without
/// touching the process environment.
pub fn parse_dotenv(plaintext: &[u8]) -> Result<HashMap<String, String>, ConfigError> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_read_iter(plaintext) {
        let (key, value) = item.map_err(|e| ConfigError::Parse(e.to_string()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Read, decrypt and parse a sealed dotenv file
pub fn load(
    path: &std::path::Path,
    secret: &str,
) -> Result<HashMap<String, String>, ConfigError> {
    let mut blob = std::fs::read(path).map_err(|source| ConfigError::SealedFile {
        path: path.to_path_buf(),
        source,
    })?;
    let plaintext = open(&blob, secret);
    blob.zeroize();
    parse_dotenv(&plaintext?)
}
