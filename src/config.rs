use crate::core::{PinError, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default name of the cookie that directs a client's reads to the primary
pub const DEFAULT_PINNING_COOKIE: &str = "multidb_pin_writes";

/// Default number of seconds reads stay on the primary after a write
pub const DEFAULT_PINNING_SECONDS: u64 = 15;

pub const ENV_PINNING_COOKIE: &str = "MULTIDB_PINNING_COOKIE";
pub const ENV_PINNING_SECONDS: &str = "MULTIDB_PINNING_SECONDS";
pub const ENV_PINNING_CHANNEL: &str = "MULTIDB_PINNING_CHANNEL";

/// Where pinning evidence is kept between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Client-held cookie
    #[default]
    Cookie,
    /// Server-side store keyed by session
    Cache,
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(Self::Cookie),
            "cache" => Ok(Self::Cache),
            other => Err(format!("channel must be cookie|cache, got '{other}'")),
        }
    }
}

/// Pinning configuration
///
/// Read once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PinningConfig {
    /// Name of the propagation cookie
    pub cookie_name: String,

    /// Length of the pinning window in seconds
    pub pinning_seconds: u64,

    /// Propagation channel used between requests
    pub channel: ChannelKind,
}

impl PinningConfig {
    pub fn new() -> Self {
        Self {
            cookie_name: DEFAULT_PINNING_COOKIE.to_string(),
            pinning_seconds: DEFAULT_PINNING_SECONDS,
            channel: ChannelKind::Cookie,
        }
    }

    /// Set the cookie name
    pub fn cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_string();
        self
    }

    /// Set the pinning window in seconds
    pub fn pinning_seconds(mut self, seconds: u64) -> Self {
        self.pinning_seconds = seconds;
        self
    }

    /// Set the propagation channel
    pub fn channel(mut self, channel: ChannelKind) -> Self {
        self.channel = channel;
        self
    }

    pub fn pinning_window(&self) -> Duration {
        Duration::from_secs(self.pinning_seconds)
    }

    /// Load from `MULTIDB_PINNING_*` environment variables
    ///
    /// Unset variables keep their defaults; the result is validated.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(name) = lookup(ENV_PINNING_COOKIE) {
            config.cookie_name = name;
        }
        if let Some(raw) = lookup(ENV_PINNING_SECONDS) {
            config.pinning_seconds = raw.trim().parse().map_err(|_| PinError::Env {
                var: ENV_PINNING_SECONDS.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(ENV_PINNING_CHANNEL) {
            config.channel = raw.parse().map_err(|_| PinError::Env {
                var: ENV_PINNING_CHANNEL.to_string(),
                value: raw.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(PinError::InvalidConfig(
                "cookie_name cannot be empty".to_string(),
            ));
        }

        if !self.cookie_name.bytes().all(is_token_byte) {
            return Err(PinError::InvalidConfig(format!(
                "cookie_name '{}' is not a valid cookie token",
                self.cookie_name
            )));
        }

        if self.pinning_seconds == 0 {
            return Err(PinError::InvalidConfig(
                "pinning_seconds must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self::new()
    }
}

// RFC 6265 cookie-name: an RFC 2616 token.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic()
        && !matches!(
            b,
            b'(' | b')'
                | b'<'
                | b'>'
                | b'@'
                | b','
                | b';'
                | b':'
                | b'\\'
                | b'"'
                | b'/'
                | b'['
                | b']'
                | b'?'
                | b'='
                | b'{'
                | b'}'
        )
}
