//! Encrypt command implementation.

use anyhow::Result;

use super::common::KeySource;

/// Execute the encrypt command.
///
/// Prints the ciphertext bits only, so the output can be piped. A key file
/// is advanced past the bits this message used.
pub fn execute(message: &str, key: Option<&str>, key_file: Option<&str>) -> Result<()> {
    let cipher = KeySource::from_args(key, key_file)?.encrypt(message)?;
    println!("{cipher}");
    Ok(())
}
