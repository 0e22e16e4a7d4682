//! Configuration loading tests

use secrecy::ExposeSecret;
use std::io::Write;
use subnet_staker::config::AppConfig;
use subnet_staker::error::AppError;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const FULL: &str = r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
stake_amount: 0.05
preferences:
  "1": 1.5
  "12": 0.5
exclude_list: [3, 7]
paused: true
telegram:
  token: "123:abc"
  chat_id: "-1001"
  update_interval: 25
gateway:
  endpoints:
    - http://bridge-a:9944
    - http://bridge-b:9944
  max_attempts: 2
server:
  enabled: false
"#;

#[test]
fn test_load_full_file() {
    let file = write_config(FULL);
    let config = AppConfig::load_from(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.wallet.name, "main");
    assert_eq!(config.validator, "5Validator");
    assert_eq!(config.stake_amount, 0.05);
    assert!(config.paused);
    assert_eq!(config.telegram.token.expose_secret(), "123:abc");
    assert_eq!(config.telegram.update_interval, 25);
    assert_eq!(config.telegram.poll_interval_secs, 3);
    assert!(config.telegram.is_enabled());
    assert_eq!(config.gateway.endpoints.len(), 2);
    assert_eq!(config.gateway.max_attempts, 2);
    assert_eq!(config.gateway.backoff_min_secs, 4);
    assert!(!config.server.enabled);

    let preferences = config.preference_map().unwrap();
    assert_eq!(preferences.get(&1), Some(&1.5));
    assert_eq!(preferences.get(&12), Some(&0.5));
    assert_eq!(
        config.exclusion_set().into_iter().collect::<Vec<_>>(),
        vec![3, 7]
    );
}

#[test]
fn test_minimal_file_uses_defaults() {
    let file = write_config(
        r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
"#,
    );
    let config = AppConfig::load_from(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.stake_amount, 0.01);
    assert!(!config.paused);
    assert!(config.preferences.is_empty());
    assert!(!config.telegram.is_enabled());
    assert_eq!(config.telegram.update_interval, 10);
    assert_eq!(config.gateway.endpoints.len(), 3);
    assert_eq!(config.server.port, 9184);
}

#[test]
fn test_unknown_keys_are_rejected() {
    let file = write_config(
        r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
telegram_token: legacy
"#,
    );
    assert!(AppConfig::load_from(file.path()).is_err());
}

#[test]
fn test_invalid_preference_fails_validation() {
    let file = write_config(
        r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
preferences:
  "4": 0.05
"#,
    );
    let config = AppConfig::load_from(file.path()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_non_numeric_preference_key_fails_validation() {
    let file = write_config(
        r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
preferences:
  apex: 1.2
"#,
    );
    let config = AppConfig::load_from(file.path()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_non_positive_stake_amount_fails_validation() {
    let file = write_config(
        r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
stake_amount: 0
"#,
    );
    let config = AppConfig::load_from(file.path()).unwrap();
    match config.validate() {
        Err(AppError::Validation(message)) => assert!(message.contains("stake_amount")),
        other => panic!("unexpected validation result: {other:?}"),
    }
}

#[test]
fn test_environment_overrides_nested_key() {
    // Only this test touches this variable
    std::env::set_var("STAKER_GATEWAY__REQUEST_TIMEOUT_MS", "4321");
    let file = write_config(
        r#"
wallet:
  name: main
  coldkey: 5Coldkey
validator: 5Validator
gateway:
  request_timeout_ms: 1000
"#,
    );
    let loaded = AppConfig::load_from(file.path());
    std::env::remove_var("STAKER_GATEWAY__REQUEST_TIMEOUT_MS");

    assert_eq!(loaded.unwrap().gateway.request_timeout_ms, 4321);
}
