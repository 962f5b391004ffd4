//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use qkd_adapter_sim::{InterceptResendChannel, SimulatorChannel};
use qkd_channel::{ChannelConfig, ChannelRegistry, QuantumChannel};
use qkd_protocol::{
    AgreedKey, Bitstring, KeyAgreement, OneTimePad, ProtocolConfig, ProtocolResult, SecureKey,
    decrypt, encrypt,
};

/// Registry name of the ideal statevector channel.
pub const SIMULATOR: &str = "simulator";
/// Registry name of the simulator with an intercept-resend attacker.
pub const INTERCEPT_RESEND: &str = "intercept-resend";

/// Channel selection flags.
#[derive(Args, Debug, Clone)]
pub struct ChannelArgs {
    /// Channel to use (simulator, intercept-resend)
    #[arg(long, default_value = SIMULATOR)]
    pub channel: String,

    /// Bit-flip probability applied to each transmitted qubit
    #[arg(long)]
    pub noise: Option<f64>,

    /// Fraction of qubits intercepted by an eavesdropper
    #[arg(long)]
    pub eavesdrop: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Protocol parameter flags, applied over the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ProtocolArgs {
    /// Protocol configuration file (YAML) [default: ~/.qkd/config.yaml]
    #[arg(long)]
    pub config: Option<String>,

    /// Positions exchanged for key material
    #[arg(long)]
    pub key_length: Option<usize>,

    /// Positions disclosed for the security check
    #[arg(long)]
    pub sample_length: Option<usize>,

    /// Minimum sample agreement (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Attempts before giving up
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl ProtocolArgs {
    /// Load the configuration file and apply flag overrides.
    pub fn resolve(&self) -> Result<ProtocolConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(n) = self.key_length {
            config = config.with_key_length(n);
        }
        if let Some(n) = self.sample_length {
            config = config.with_sample_length(n);
        }
        if let Some(t) = self.threshold {
            config = config.with_threshold(t);
        }
        if let Some(n) = self.max_attempts {
            config = config.with_max_attempts(n);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Every channel the CLI can open.
pub fn channel_registry() -> ChannelRegistry {
    let mut registry = ChannelRegistry::new();
    registry.register::<SimulatorChannel>(SIMULATOR);
    registry.register::<InterceptResendChannel<SimulatorChannel>>(INTERCEPT_RESEND);
    registry
}

/// Map user input to a registry name and channel configuration.
pub fn channel_config(args: &ChannelArgs) -> Result<(&'static str, ChannelConfig)> {
    let name = match args.channel.to_lowercase().as_str() {
        "simulator" | "sim" if args.eavesdrop.is_some() => INTERCEPT_RESEND,
        "simulator" | "sim" => SIMULATOR,
        "intercept-resend" | "eve" => INTERCEPT_RESEND,
        other => {
            anyhow::bail!("Unknown channel: '{other}'. Available: {SIMULATOR}, {INTERCEPT_RESEND}");
        }
    };

    let mut config = ChannelConfig::new(name);
    if let Some(noise) = args.noise {
        config = config.with_extra("noise", json!(noise));
    }
    if let Some(ratio) = args.eavesdrop {
        config = config.with_extra("eavesdrop", json!(ratio));
    }
    if let Some(seed) = args.seed {
        config = config.with_extra("seed", json!(seed));
    }
    Ok((name, config))
}

/// Open the channel selected by `args`.
pub fn open_channel(args: &ChannelArgs) -> Result<Box<dyn QuantumChannel>> {
    let (name, config) = channel_config(args)?;
    channel_registry()
        .create(name, config)
        .with_context(|| format!("Failed to open channel '{name}'"))
}

/// Run key agreement with a spinner on the terminal.
pub async fn run_agreement(channel_args: &ChannelArgs, protocol_args: &ProtocolArgs) -> Result<AgreedKey> {
    let config = protocol_args.resolve()?;
    let channel = open_channel(channel_args)?;

    println!(
        "{} Agreeing on a key over {} ({} qubits per attempt, up to {} attempts)",
        style("→").cyan().bold(),
        style(channel.name()).yellow(),
        config.exchange_length(),
        config.max_attempts
    );

    let agreement = KeyAgreement::new(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Exchanging qubits...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = match channel_args.seed {
        // Offset past the seeds handed to the channel and the attacker.
        Some(seed) => {
            agreement
                .run_with_rng(channel.as_ref(), StdRng::seed_from_u64(seed.wrapping_add(2)))
                .await
        }
        None => agreement.run(channel.as_ref()).await,
    };
    spinner.finish_and_clear();

    result.context("Key agreement failed")
}

/// Print an agreed key and its attempt history.
pub fn print_agreement(key: &AgreedKey) {
    println!(
        "\n{} Key agreed after {} attempt(s) in {} ms",
        style("✓").green().bold(),
        key.attempts,
        style(key.elapsed_ms).yellow()
    );
    println!("  Sample agreement: {:.3}", key.sample_agreement);
    println!("  Raw sifted bits:  {}", key.raw_length);
    println!("  Key bits:         {}", key.preparer.len());

    if key.keys_match() {
        println!("  Parties match:    {}", style("yes").green());
    } else {
        println!(
            "  Parties match:    {} (error rate {:.3})",
            style("no").red(),
            key.key_error_rate()
        );
    }

    if key.history.len() > 1 {
        println!("\n  Attempts:");
        for report in &key.history {
            let agreement = report
                .agreement
                .map_or_else(|| "-".to_string(), |a| format!("{a:.3}"));
            println!(
                "    #{:<3} sample {:>4}  agreement {:>5}  {:?}",
                report.attempt, report.sample_size, agreement, report.outcome
            );
        }
    }

    println!("\n  Key: {}", style(key.preparer.to_string()).cyan());
}

/// Output format for agreement results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Table,
    /// The full agreed key as JSON.
    Json,
}

/// On-disk form of one party's copy of an agreed key.
///
/// `used` counts the leading key bits already spent by earlier messages.
/// It only ever grows, so a key file never hands out the same bits twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    /// Key bits.
    pub key: SecureKey,
    /// Key bits already consumed.
    #[serde(default)]
    pub used: usize,
    /// Attempts the agreement took.
    pub attempts: u32,
    /// Sample agreement of the accepted attempt.
    pub sample_agreement: f64,
}

impl KeyFile {
    /// The Preparer's copy, unused.
    pub fn preparer(agreed: &AgreedKey) -> Self {
        Self::unused(agreed.preparer.clone(), agreed)
    }

    /// The Measurer's copy, unused.
    pub fn measurer(agreed: &AgreedKey) -> Self {
        Self::unused(agreed.measurer.clone(), agreed)
    }

    fn unused(key: SecureKey, agreed: &AgreedKey) -> Self {
        Self {
            key,
            used: 0,
            attempts: agreed.attempts,
            sample_agreement: agreed.sample_agreement,
        }
    }

    /// A pad positioned after the bits already consumed.
    pub fn pad(&self) -> Result<OneTimePad> {
        OneTimePad::resume(self.key.clone(), self.used).context("Key file offset is corrupt")
    }
}

/// Write a key file as pretty JSON.
pub fn save_key(path: &Path, key: &KeyFile) -> Result<()> {
    let json = serde_json::to_string_pretty(key).context("JSON serialization failed")?;
    fs::write(path, json).with_context(|| format!("Failed to write key file: {}", path.display()))
}

/// Read a key file.
pub fn load_key(path: &Path) -> Result<KeyFile> {
    if !path.exists() {
        anyhow::bail!("Key file not found: {}", path.display());
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file: {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid key file: {}", path.display()))
}

/// Where encrypt and decrypt take their key bits from.
#[derive(Debug)]
pub enum KeySource {
    /// Bits given on the command line, used from the first bit.
    Inline(Bitstring),
    /// A key file whose consumed offset advances after every use.
    File(PathBuf),
}

impl KeySource {
    /// Key source from either `--key` or `--key-file`.
    pub fn from_args(key: Option<&str>, key_file: Option<&str>) -> Result<Self> {
        match (key, key_file) {
            (Some(bits), None) => Ok(Self::Inline(bits.parse().context("Invalid key")?)),
            (None, Some(path)) => Ok(Self::File(PathBuf::from(path))),
            _ => anyhow::bail!("Provide exactly one of --key or --key-file"),
        }
    }

    /// Encrypt `message`.
    pub fn encrypt(&self, message: &str) -> Result<Bitstring> {
        match self {
            Self::Inline(key) => encrypt(message, key).context("Encryption failed"),
            Self::File(path) => {
                with_pad(path, |pad| pad.encrypt(message)).context("Encryption failed")
            }
        }
    }

    /// Decrypt `cipher`.
    pub fn decrypt(&self, cipher: &Bitstring) -> Result<String> {
        match self {
            Self::Inline(key) => decrypt(cipher, key).context("Decryption failed"),
            Self::File(path) => {
                with_pad(path, |pad| pad.decrypt(cipher)).context("Decryption failed")
            }
        }
    }
}

/// Run `op` on the pad stored at `path`, then record the bits it consumed.
///
/// The file is rewritten only when `op` succeeds.
fn with_pad<T>(path: &Path, op: impl FnOnce(&mut OneTimePad) -> ProtocolResult<T>) -> Result<T> {
    let mut file = load_key(path)?;
    let mut pad = file.pad()?;
    let out = op(&mut pad)?;
    file.used = pad.used();
    save_key(path, &file)?;
    debug!(
        path = %path.display(),
        used = file.used,
        remaining = pad.remaining(),
        "key file advanced"
    );
    Ok(out)
}

/// Location of the user configuration file (~/.qkd/config.yaml).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".qkd").join("config.yaml"))
}

/// Load protocol parameters from `path`, or from the default location if
/// present, or fall back to defaults.
pub fn load_config(path: Option<&str>) -> Result<ProtocolConfig> {
    match path {
        Some(path) => read_config(Path::new(path)),
        None => match default_config_path() {
            Some(path) if path.exists() => read_config(&path),
            _ => Ok(ProtocolConfig::default()),
        },
    }
}

/// Parse a YAML protocol configuration file.
pub fn read_config(path: &Path) -> Result<ProtocolConfig> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if source.trim().is_empty() {
        return Ok(ProtocolConfig::default());
    }
    serde_yaml_ng::from_str(&source)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}
