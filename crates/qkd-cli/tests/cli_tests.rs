//! CLI file format tests.
//!
//! The CLI is a binary crate, so these tests exercise the formats it reads
//! and writes through the library crates: YAML protocol configuration and
//! JSON key output.

// ============================================================================
// Protocol configuration (YAML)
// ============================================================================

mod config_format {
    use std::fs;

    use qkd_protocol::ProtocolConfig;

    #[test]
    fn test_full_config() {
        let yaml = "key_length: 1000\nsample_length: 100\nthreshold: 0.95\nmax_attempts: 10\n";
        let config: ProtocolConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.exchange_length(), 1100);
        assert_eq!(config.threshold, 0.95);
        assert_eq!(config.max_attempts, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ProtocolConfig = serde_yaml_ng::from_str("sample_length: 20\n").unwrap();
        assert_eq!(config.key_length, 500);
        assert_eq!(config.sample_length, 20);
        assert_eq!(config.threshold, 0.9);
    }

    #[test]
    fn test_invalid_values_parse_but_fail_validation() {
        let config: ProtocolConfig = serde_yaml_ng::from_str("max_attempts: 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = ProtocolConfig::default().with_key_length(64);
        fs::write(&path, serde_yaml_ng::to_string(&config).unwrap()).unwrap();

        let source = fs::read_to_string(&path).unwrap();
        let loaded: ProtocolConfig = serde_yaml_ng::from_str(&source).unwrap();
        assert_eq!(loaded, config);
    }
}

// ============================================================================
// Key output (JSON)
// ============================================================================

mod key_format {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use qkd_adapter_sim::SimulatorChannel;
    use qkd_protocol::{AgreedKey, KeyAgreement, ProtocolConfig, SecureKey};

    #[tokio::test]
    async fn test_agreed_key_json() {
        let channel = SimulatorChannel::with_seed(1);
        let key = KeyAgreement::new(ProtocolConfig::default().with_key_length(100))
            .unwrap()
            .run_with_rng(&channel, StdRng::seed_from_u64(2))
            .await
            .unwrap();

        let json = serde_json::to_value(&key).unwrap();
        assert!(json["preparer"].is_string());
        assert_eq!(json["attempts"], 1);
        assert_eq!(json["history"][0]["outcome"], "accepted");

        let restored: AgreedKey = serde_json::from_value(json).unwrap();
        assert_eq!(restored.preparer, key.preparer);
    }

    #[test]
    fn test_key_bits_rejected_when_malformed() {
        assert!(serde_json::from_str::<SecureKey>("\"0102\"").is_err());
        let key: SecureKey = serde_json::from_str("\"0110\"").unwrap();
        assert_eq!(key.len(), 4);
    }
}
