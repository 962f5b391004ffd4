//! Keygen command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use super::common::{
    ChannelArgs, KeyFile, OutputFormat, ProtocolArgs, print_agreement, run_agreement, save_key,
};

/// Execute the keygen command.
pub async fn execute(
    channel: &ChannelArgs,
    protocol: &ProtocolArgs,
    output: Option<&str>,
    peer_output: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let key = run_agreement(channel, protocol).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&key).context("JSON serialization failed")?;
            println!("{json}");
        }
        OutputFormat::Table => print_agreement(&key),
    }

    let copies = [
        (output, KeyFile::preparer(&key)),
        (peer_output, KeyFile::measurer(&key)),
    ];
    for (path, file) in copies {
        let Some(path) = path else { continue };
        save_key(Path::new(path), &file)?;
        println!(
            "\n{} Key written to {}",
            style("✓").green().bold(),
            style(path).green()
        );
    }

    Ok(())
}
