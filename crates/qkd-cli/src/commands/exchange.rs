//! Exchange command implementation.
//!
//! Runs a key agreement, then carries one message from Preparer to
//! Measurer, each side using its own copy of the key.

use anyhow::{Context, Result};
use console::style;
use tracing::warn;

use qkd_protocol::OneTimePad;

use super::common::{ChannelArgs, ProtocolArgs, print_agreement, run_agreement};

/// Execute the exchange command.
pub async fn execute(message: &str, channel: &ChannelArgs, protocol: &ProtocolArgs) -> Result<()> {
    let key = run_agreement(channel, protocol).await?;
    print_agreement(&key);

    let mut preparer = OneTimePad::new(key.preparer.clone());
    let mut measurer = OneTimePad::new(key.measurer.clone());

    let cipher = preparer
        .encrypt(message)
        .context("Preparer could not encrypt the message")?;
    println!("\n{} Preparer sends: {}", style("→").cyan().bold(), cipher);

    match measurer.decrypt(&cipher) {
        Ok(received) if received == message => {
            println!(
                "{} Measurer reads: {}",
                style("✓").green().bold(),
                style(received).green()
            );
        }
        Ok(received) => {
            warn!(error_rate = key.key_error_rate(), "keys disagree");
            println!(
                "{} Measurer reads: {} (keys disagree)",
                style("✗").red().bold(),
                style(received).red()
            );
        }
        Err(e) => {
            warn!(error_rate = key.key_error_rate(), "keys disagree");
            anyhow::bail!("Measurer could not decrypt the message: {e}");
        }
    }

    println!("  Pad bits left: {}", preparer.remaining());
    Ok(())
}
