//! Parsing configuration files of varying completeness.

use cov2k_config::{AppConfig, ConfigError, ConfigLoader};
use std::io::Write;
use test_case::test_case;

#[test]
fn test_empty_file_is_all_defaults() {
    let config = ConfigLoader::from_toml_str("").unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.chain.max_intermediate_values, 10_000);
    assert_eq!(config.server.max_filter_params, 1);
}

#[test]
fn test_partial_sections() {
    let toml_str = r#"
[server]
port = 9000

[storage.sqlite]
path = ":memory:"
wal_mode = false

[chain]
fan_out_concurrency = 2
"#;
    let config = ConfigLoader::from_toml_str(toml_str).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(config.storage.sqlite.is_memory());
    assert!(!config.storage.sqlite.wal_mode);
    assert!(config.storage.sqlite.foreign_keys);
    assert_eq!(config.chain.fan_out_concurrency, 2);
    assert_eq!(config.chain.default_limit, 200);
}

#[test]
fn test_round_trip() {
    let config = AppConfig::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    let parsed = ConfigLoader::from_toml_str(&toml_str).unwrap();
    assert_eq!(config, parsed);
}

#[test]
fn test_malformed_toml() {
    let err = ConfigLoader::from_toml_str("[server\nport = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test_case("[server]\nport = 0", "server.port"; "zero port")]
#[test_case("[chain]\nfan_out_concurrency = 0", "chain.fan_out_concurrency"; "zero concurrency")]
#[test_case("[chain]\nmax_intermediate_values = 0", "chain.max_intermediate_values"; "zero cap")]
#[test_case("[chain]\ndefault_limit = 0", "chain.default_limit"; "zero limit")]
fn test_validation_rejects(toml_str: &str, field: &str) {
    let config = ConfigLoader::from_toml_str(toml_str).unwrap();
    match ConfigLoader::validate(&config) {
        Err(ConfigError::InvalidValue { field: f, .. }) => assert_eq!(f, field),
        other => panic!("expected invalid {field}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[storage]\nknowledge_base = \"/srv/kb.json\"").unwrap();
    let config = ConfigLoader::load_from_file(file.path()).await.unwrap();
    assert_eq!(config.storage.knowledge_base.to_str(), Some("/srv/kb.json"));
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load_from_file(dir.path().join("nope.toml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[tokio::test]
async fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigLoader::load_or_default(dir.path().join("nope.toml"))
        .await
        .unwrap();
    assert_eq!(config.server.port, AppConfig::default().server.port);
}
