//! QKD Command-Line Interface
//!
//! The main entry point for the `qkd` tool.
//!
//! ```text
//!   Preparer ── |0⟩ |+⟩ |1⟩ |−⟩ ... ──▶ Measurer
//!       │                                   │
//!       └──── bases · sample · check ───────┘
//!                      │
//!                 shared key
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{ChannelArgs, OutputFormat, ProtocolArgs};
use commands::{channels, decrypt, encrypt, exchange, keygen, version};

/// qkd - BB84 quantum key distribution over simulated channels
#[derive(Parser)]
#[command(name = "qkd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Agree on a shared key over a quantum channel
    Keygen {
        #[command(flatten)]
        channel: ChannelArgs,

        #[command(flatten)]
        protocol: ProtocolArgs,

        /// Write the Preparer's key to a JSON key file
        #[arg(short, long)]
        output: Option<String>,

        /// Write the Measurer's key to a JSON key file
        #[arg(long)]
        peer_output: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Encrypt a message with a one-time pad
    Encrypt {
        /// Plaintext message
        #[arg(short, long)]
        message: String,

        /// Key bits ('0'/'1')
        #[arg(short, long, conflicts_with = "key_file", required_unless_present = "key_file")]
        key: Option<String>,

        /// Key file written by `qkd keygen`; its unused bits are consumed
        #[arg(long)]
        key_file: Option<String>,
    },

    /// Decrypt a ciphertext bitstring with a one-time pad
    Decrypt {
        /// Ciphertext bits ('0'/'1')
        #[arg(short, long)]
        cipher: String,

        /// Key bits ('0'/'1')
        #[arg(short, long, conflicts_with = "key_file", required_unless_present = "key_file")]
        key: Option<String>,

        /// Key file written by `qkd keygen --peer-output`; its unused bits are consumed
        #[arg(long)]
        key_file: Option<String>,
    },

    /// Agree on a key, then send a message across with it
    Exchange {
        /// Message sent from Preparer to Measurer
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        channel: ChannelArgs,

        #[command(flatten)]
        protocol: ProtocolArgs,
    },

    /// List available channels
    Channels,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Keygen {
            channel,
            protocol,
            output,
            peer_output,
            format,
        } => {
            keygen::execute(
                &channel,
                &protocol,
                output.as_deref(),
                peer_output.as_deref(),
                format,
            )
            .await
        }

        Commands::Encrypt {
            message,
            key,
            key_file,
        } => encrypt::execute(&message, key.as_deref(), key_file.as_deref()),

        Commands::Decrypt {
            cipher,
            key,
            key_file,
        } => decrypt::execute(&cipher, key.as_deref(), key_file.as_deref()),

        Commands::Exchange {
            message,
            channel,
            protocol,
        } => exchange::execute(&message, &channel, &protocol).await,

        Commands::Channels => channels::execute(),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keygen_defaults() {
        let cli = Cli::try_parse_from(["qkd", "keygen"]).unwrap();
        match cli.command {
            Commands::Keygen {
                channel,
                protocol,
                output,
                peer_output,
                format,
            } => {
                assert_eq!(channel.channel, "simulator");
                assert!(channel.noise.is_none());
                assert!(channel.eavesdrop.is_none());
                assert!(protocol.key_length.is_none());
                assert!(output.is_none());
                assert!(peer_output.is_none());
                assert_eq!(format, OutputFormat::Table);
            }
            _ => panic!("expected keygen"),
        }
    }

    #[test]
    fn test_parse_keygen_all_args() {
        let cli = Cli::try_parse_from([
            "qkd",
            "keygen",
            "--channel",
            "sim",
            "--noise",
            "0.05",
            "--eavesdrop",
            "0.5",
            "--seed",
            "7",
            "--key-length",
            "200",
            "--sample-length",
            "40",
            "--threshold",
            "0.8",
            "--max-attempts",
            "5",
            "--config",
            "qkd.yaml",
            "-o",
            "key.json",
            "--peer-output",
            "peer.json",
            "-f",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Keygen {
                channel,
                protocol,
                output,
                peer_output,
                format,
            } => {
                assert_eq!(channel.channel, "sim");
                assert_eq!(channel.noise, Some(0.05));
                assert_eq!(channel.eavesdrop, Some(0.5));
                assert_eq!(channel.seed, Some(7));
                assert_eq!(protocol.key_length, Some(200));
                assert_eq!(protocol.sample_length, Some(40));
                assert_eq!(protocol.threshold, Some(0.8));
                assert_eq!(protocol.max_attempts, Some(5));
                assert_eq!(protocol.config.as_deref(), Some("qkd.yaml"));
                assert_eq!(output.as_deref(), Some("key.json"));
                assert_eq!(peer_output.as_deref(), Some("peer.json"));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected keygen"),
        }
    }

    #[test]
    fn test_parse_encrypt_with_key() {
        let cli = Cli::try_parse_from(["qkd", "encrypt", "-m", "Hi", "-k", "0101"]).unwrap();
        match cli.command {
            Commands::Encrypt {
                message,
                key,
                key_file,
            } => {
                assert_eq!(message, "Hi");
                assert_eq!(key.as_deref(), Some("0101"));
                assert!(key_file.is_none());
            }
            _ => panic!("expected encrypt"),
        }
    }

    #[test]
    fn test_parse_decrypt_with_key_file() {
        let cli =
            Cli::try_parse_from(["qkd", "decrypt", "-c", "0101", "--key-file", "k.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Decrypt { key: None, key_file: Some(_), .. }
        ));
    }

    #[test]
    fn test_key_sources_are_exclusive() {
        assert!(Cli::try_parse_from(["qkd", "encrypt", "-m", "Hi"]).is_err());
        assert!(
            Cli::try_parse_from([
                "qkd", "encrypt", "-m", "Hi", "-k", "01", "--key-file", "k.json"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_parse_exchange() {
        let cli =
            Cli::try_parse_from(["qkd", "exchange", "-m", "hello", "--seed", "3"]).unwrap();
        match cli.command {
            Commands::Exchange {
                message, channel, ..
            } => {
                assert_eq!(message, "hello");
                assert_eq!(channel.seed, Some(3));
            }
            _ => panic!("expected exchange"),
        }
    }

    #[test]
    fn test_parse_channels_and_version() {
        let cli = Cli::try_parse_from(["qkd", "channels"]).unwrap();
        assert!(matches!(cli.command, Commands::Channels));
        let cli = Cli::try_parse_from(["qkd", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_parse_verbose() {
        let cli = Cli::try_parse_from(["qkd", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["qkd", "channels", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_errors() {
        assert!(Cli::try_parse_from(["qkd"]).is_err());
        assert!(Cli::try_parse_from(["qkd", "teleport"]).is_err());
        assert!(Cli::try_parse_from(["qkd", "keygen", "--noise", "lots"]).is_err());
        assert!(Cli::try_parse_from(["qkd", "keygen", "-f", "xml"]).is_err());
        assert!(Cli::try_parse_from(["qkd", "keygen", "--format", "JSON"]).is_err());
    }
}
