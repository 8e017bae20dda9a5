//! Client configuration.
//!
//! Loaded from a TOML file, with `$VAR` / `${VAR}` references expanded from
//! the environment, then overridden by:
//!
//! - `FEEDPAY_BASE_URL` - API origin
//! - `FEEDPAY_TESTNET` - `true`/`false`, selects Base Sepolia or Base
//! - `FEEDPAY_PRIVATE_KEY` - hex private key for a local wallet
//! - `FEEDPAY_BATCH_DELAY_MS` - pause between items of a batch create
//!
//! ```toml
//! base_url = "https://api.feedpay.example"
//! testnet = true
//! private_key = "${MY_WALLET_KEY}"
//! batch_delay_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use feedpay::Network;
use feedpay::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "FEEDPAY_BASE_URL";
/// Environment variable overriding [`ClientConfig::testnet`].
pub const TESTNET_ENV: &str = "FEEDPAY_TESTNET";
/// Environment variable overriding [`ClientConfig::private_key`].
pub const PRIVATE_KEY_ENV: &str = "FEEDPAY_PRIVATE_KEY";
/// Environment variable overriding [`ClientConfig::batch_delay_ms`].
pub const BATCH_DELAY_ENV: &str = "FEEDPAY_BATCH_DELAY_MS";

/// Construction options of a [`FeedClient`](crate::FeedClient).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API origin, e.g. `https://api.feedpay.example`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Use Base Sepolia instead of Base.
    #[serde(default)]
    pub testnet: bool,

    /// Hex private key of a local wallet.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Pause between items of a batch create, in milliseconds.
    #[serde(default)]
    pub batch_delay_ms: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("testnet", &self.testnet)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("batch_delay_ms", &self.batch_delay_ms)
            .finish()
    }
}

impl ClientConfig {
    /// Loads configuration from `path`, expanding and overriding from the
    /// process environment.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Parse`] if it is not valid TOML, or
    /// [`ConfigError::InvalidValue`] for an unusable environment override.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };
        Self::from_toml_with(&content, |name| std::env::var(name).ok())
    }

    /// Configuration from the environment alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unusable override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parses `content`, resolving variables and overrides through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or
    /// [`ConfigError::InvalidValue`] for an unusable override.
    pub fn from_toml_with(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content, &lookup);
        let mut config: Self =
            toml::from_str(&expanded).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = Some(base_url);
        }
        if let Some(testnet) = lookup(TESTNET_ENV) {
            self.testnet = parse_bool(&testnet).ok_or(ConfigError::InvalidValue {
                key: TESTNET_ENV,
                value: testnet,
            })?;
        }
        if let Some(private_key) = lookup(PRIVATE_KEY_ENV) {
            self.private_key = Some(private_key);
        }
        if let Some(delay) = lookup(BATCH_DELAY_ENV) {
            self.batch_delay_ms = delay.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: BATCH_DELAY_ENV,
                value: delay,
            })?;
        }
        Ok(())
    }

    /// The network selected by [`Self::testnet`].
    #[must_use]
    pub const fn network(&self) -> Network {
        Network::from_testnet(self.testnet)
    }

    /// The batch delay as a [`Duration`].
    #[must_use]
    pub const fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        if var_name.is_empty() {
            result.push('$');
            if braced {
                result.push_str("{}");
            }
        } else if let Some(value) = lookup(&var_name) {
            result.push_str(&value);
        } else if braced {
            result.push_str("${");
            result.push_str(&var_name);
            result.push('}');
        } else {
            result.push('$');
            result.push_str(&var_name);
        }
    }

    result
}
