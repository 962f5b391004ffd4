//! Decrypt command implementation.

use anyhow::{Context, Result};

use qkd_protocol::Bitstring;

use super::common::KeySource;

/// Execute the decrypt command.
pub fn execute(cipher: &str, key: Option<&str>, key_file: Option<&str>) -> Result<()> {
    let source = KeySource::from_args(key, key_file)?;
    let cipher: Bitstring = cipher.parse().context("Invalid ciphertext")?;
    let message = source.decrypt(&cipher)?;
    println!("{message}");
    Ok(())
}
