//! One-shot provisioning of terminal API keys.
//!
//! A key is 32 random bytes, hex encoded. Only the salted hash
//! `hex(sha256(pepper || key))` is stored server side; the plain key is shown
//! once to the operator.

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const KEY_BYTES: usize = 32;
/// Leading characters of the key stored next to the hash for lookup.
pub const KEY_PREFIX_LEN: usize = 8;
pub const PEPPER_ENV: &str = "TERMINAL_KEY_PEPPER";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("TERMINAL_KEY_PEPPER is empty")]
    EmptyPepper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedKey {
    pub api_key: String,
    pub key_prefix: String,
    pub key_hash: String,
}

pub fn provision_terminal_key(pepper: &str) -> Result<ProvisionedKey, KeyError> {
    let mut raw = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut raw);
    key_from_bytes(pepper, &raw)
}

pub fn hash_terminal_key(pepper: &str, api_key: &str) -> Result<String, KeyError> {
    if pepper.is_empty() {
        return Err(KeyError::EmptyPepper);
    }
    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    hasher.update(api_key.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn key_from_bytes(pepper: &str, raw: &[u8]) -> Result<ProvisionedKey, KeyError> {
    let api_key = hex::encode(raw);
    let key_hash = hash_terminal_key(pepper, &api_key)?;
    Ok(ProvisionedKey {
        key_prefix: api_key[..KEY_PREFIX_LEN].to_string(),
        api_key,
        key_hash,
    })
}
