//! Configuration management for the subnet staker
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values. Unknown keys are rejected.

use crate::constants::preference::MIN_MULTIPLIER;
use crate::error::{AppError, AppResult};
use crate::models::Wallet;
use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Staking wallet
    pub wallet: WalletConfig,
    /// Validator hotkey all stake is delegated to
    pub validator: String,
    /// Base stake unit in TAO, scaled by the subnet preference
    #[serde(default = "default_stake_amount")]
    pub stake_amount: f64,
    /// Preference multipliers keyed by subnet id (as text)
    #[serde(default)]
    pub preferences: HashMap<String, f64>,
    /// Subnets never considered for allocation
    #[serde(default)]
    pub exclude_list: Vec<u16>,
    /// Start with allocation paused
    #[serde(default)]
    pub paused: bool,
    /// Telegram control channel and digests
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Chain gateway endpoints and retry policy
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Health and metrics server
    #[serde(default)]
    pub server: ServerConfig,
}

/// Wallet identity
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    /// Wallet name known to the signing bridge
    pub name: String,
    /// Coldkey SS58 address
    pub coldkey: String,
}

fn default_stake_amount() -> f64 {
    0.01
}

/// Telegram configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot token from @BotFather (STAKER_TELEGRAM__TOKEN)
    #[serde(default = "default_token")]
    pub token: SecretString,
    /// Default chat for digests
    #[serde(default)]
    pub chat_id: String,
    /// Digest cadence in blocks
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
    /// Seconds between getUpdates polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_token() -> SecretString {
    SecretString::new(String::new())
}

fn default_update_interval() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    3
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: default_token(),
            chat_id: String::new(),
            update_interval: default_update_interval(),
            poll_interval_secs: default_poll_interval(),
            api_url: default_telegram_api_url(),
        }
    }
}

impl TelegramConfig {
    /// Telegram is only used when both token and chat id are set
    pub fn is_enabled(&self) -> bool {
        !self.token.expose_secret().is_empty() && !self.chat_id.is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Chain gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Bridge endpoints in priority order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    /// Connection attempts per endpoint
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff between attempts on one endpoint
    #[serde(default = "default_backoff_min")]
    pub backoff_min_secs: u64,
    /// Backoff cap
    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,
    /// Block height poll interval used while waiting for the next block
    #[serde(default = "default_block_poll_interval")]
    pub block_poll_interval_ms: u64,
    /// HTTP request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_endpoints() -> Vec<String> {
    vec![
        "http://127.0.0.1:9944/finney".to_string(),
        "http://127.0.0.1:9944/subvortex".to_string(),
        "http://127.0.0.1:9944/archive".to_string(),
    ]
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_min() -> u64 {
    4
}

fn default_backoff_max() -> u64 {
    10
}

fn default_block_poll_interval() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            max_attempts: default_max_attempts(),
            backoff_min_secs: default_backoff_min(),
            backoff_max_secs: default_backoff_max(),
            block_poll_interval_ms: default_block_poll_interval(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Serve /health and /metrics
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_server_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9184
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (STAKER_*)
    /// 2. config/config.yaml (if exists)
    /// 3. config.yaml (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false));

        Self::build(builder)
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from(path));

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config = builder
            // STAKER_TELEGRAM__CHAT_ID=123 -> telegram.chat_id = 123
            .add_source(
                Environment::with_prefix("STAKER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("exclude_list")
                    .with_list_parse_key("gateway.endpoints"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        if self.wallet.name.is_empty() || self.wallet.coldkey.is_empty() {
            return Err(AppError::Validation(
                "wallet.name and wallet.coldkey must be set".to_string(),
            ));
        }

        if self.validator.is_empty() {
            return Err(AppError::Validation("validator hotkey must be set".to_string()));
        }

        if !self.stake_amount.is_finite() || self.stake_amount <= 0.0 {
            return Err(AppError::Validation(format!(
                "stake_amount must be a positive number, got {}",
                self.stake_amount
            )));
        }

        // Surfaces non-numeric keys and multipliers below the floor
        self.preference_map()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.telegram.update_interval == 0 {
            return Err(AppError::Validation(
                "telegram.update_interval must be at least 1 block".to_string(),
            ));
        }

        if self.gateway.endpoints.is_empty() {
            return Err(AppError::Validation(
                "gateway.endpoints must list at least one endpoint".to_string(),
            ));
        }

        if self.gateway.max_attempts == 0 {
            return Err(AppError::Validation(
                "gateway.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.gateway.backoff_min_secs > self.gateway.backoff_max_secs {
            return Err(AppError::Validation(
                "gateway backoff floor must not exceed its cap".to_string(),
            ));
        }

        Ok(())
    }

    /// Preferences keyed by numeric subnet id
    pub fn preference_map(&self) -> Result<HashMap<u16, f64>, ConfigError> {
        let mut preferences = HashMap::with_capacity(self.preferences.len());
        for (key, multiplier) in &self.preferences {
            let netuid: u16 = key.trim().parse().map_err(|_| {
                ConfigError::Message(format!("preference key '{}' is not a subnet id", key))
            })?;
            if !multiplier.is_finite() || *multiplier < MIN_MULTIPLIER {
                return Err(ConfigError::Message(format!(
                    "preference for subnet {} must be at least {}, got {}",
                    netuid, MIN_MULTIPLIER, multiplier
                )));
            }
            preferences.insert(netuid, *multiplier);
        }
        Ok(preferences)
    }

    pub fn exclusion_set(&self) -> BTreeSet<u16> {
        self.exclude_list.iter().copied().collect()
    }

    pub fn wallet(&self) -> Wallet {
        Wallet {
            name: self.wallet.name.clone(),
            coldkey: self.wallet.coldkey.clone(),
        }
    }
}
