//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - BB84 quantum key distribution",
        style("qkd").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qkd-channel      Quantum channel abstraction");
    println!("  qkd-adapter-sim  Statevector and intercept-resend channels");
    println!("  qkd-protocol     Key agreement and one-time pad");
    println!("  qkd-cli          Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
