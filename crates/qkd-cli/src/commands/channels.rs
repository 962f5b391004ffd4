//! Channels command implementation.

use anyhow::Result;
use console::style;

use qkd_channel::ChannelConfig;

use super::common::channel_registry;

/// Execute the channels command.
pub fn execute() -> Result<()> {
    println!("{} Available channels:\n", style("qkd").cyan().bold());

    let registry = channel_registry();
    for name in registry.list() {
        let channel = registry.create(&name, ChannelConfig::new(name.as_str()))?;
        let caps = channel.capabilities();

        println!(
            "  {} {} {}",
            style("●").green(),
            style(&name).bold(),
            if caps.is_simulator { "(local)" } else { "" }
        );
        println!("    Max pending qubits: {}", caps.max_pending_qubits);
        if !caps.features.is_empty() {
            println!("    Features: {}", caps.features.join(", "));
        }
        println!();
    }

    println!("  Options: --noise <p>, --eavesdrop <ratio>, --seed <n>");
    Ok(())
}
