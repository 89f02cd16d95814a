//! Configuration for rate limiting, retry and HTTP.
//!
//! Configuration is TOML, layered with the `config` crate:
//! - Bundled defaults (include_str! from jcall.toml)
//! - User overrides (~/.config/jcall/jcall.toml, then ./jcall.toml)
//!
//! Credentials are never read from configuration files.

use crate::Strategy;
use config::{Config, File, FileFormat};
use jcall_error::{ConfigError, JCallError, JCallResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Requests per second when nothing else is configured.
pub const DEFAULT_RATE: f64 = 1.0;
/// Default burst ceiling.
pub const DEFAULT_MAX_TOKENS: u32 = 5;
/// Default window length for windowed strategies, in seconds.
pub const DEFAULT_WINDOW_SIZE_SECS: f64 = 60.0;
/// Floor on any admission wait, in milliseconds.
pub const MIN_WAIT_MS: u64 = 100;
/// Default retry count after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default base retry delay, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
/// Default growth factor between retries.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.5;
/// Ceiling on a single retry delay, in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;
/// Fraction of each retry delay added at random.
pub const DEFAULT_RETRY_JITTER: f64 = 0.1;
/// Statuses retried by default.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
/// JustCall API host.
pub const DEFAULT_BASE_URL: &str = "https://api.justcall.io";

/// Admission control settings.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// rate = 1.0
/// max_tokens = 5
/// strategy = "token_bucket"
///
/// [rate_limit.endpoint_limits]
/// calls = 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub rate: f64,
    /// Burst ceiling (token bucket capacity)
    pub max_tokens: u32,
    /// Admission algorithm
    pub strategy: Strategy,
    /// Window length for windowed strategies, in seconds
    pub window_size_secs: f64,
    /// Floor on any admission wait, in milliseconds
    pub min_wait_ms: u64,
    /// Random extra wait, as a fraction of the computed wait
    pub jitter_fraction: f64,
    /// Safety factor applied to server-reported reset times (> 1.0)
    pub buffer_factor: f64,
    /// Cap on the progressive throttling multiplier
    pub max_backoff_multiplier: f64,
    /// Per resource key rates, overriding `rate`
    pub endpoint_limits: HashMap<String, f64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            max_tokens: DEFAULT_MAX_TOKENS,
            strategy: Strategy::default(),
            window_size_secs: DEFAULT_WINDOW_SIZE_SECS,
            min_wait_ms: MIN_WAIT_MS,
            jitter_fraction: 0.1,
            buffer_factor: 1.2,
            max_backoff_multiplier: 4.0,
            endpoint_limits: HashMap::new(),
        }
    }
}

impl RateLimitConfig {
    /// Window length as a duration.
    pub fn window(&self) -> Duration {
        crate::strategy::duration_from_secs(self.window_size_secs)
    }

    /// Minimum admission wait as a duration.
    pub fn min_wait(&self) -> Duration {
        Duration::from_millis(self.min_wait_ms)
    }

    /// Rate for a resource key, falling back to the global rate.
    pub fn rate_for(&self, key: Option<&str>) -> f64 {
        key.and_then(|key| self.endpoint_limits.get(key))
            .copied()
            .unwrap_or(self.rate)
    }

    /// Reject values the limiter cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(
                    format!("rate_limit.{}", name),
                    format!("must be a positive number, got {}", value),
                ))
            }
        };
        positive("rate", self.rate)?;
        positive("window_size_secs", self.window_size_secs)?;
        for (key, rate) in &self.endpoint_limits {
            positive(&format!("endpoint_limits.{}", key), *rate)?;
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::invalid("rate_limit.max_tokens", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(ConfigError::invalid(
                "rate_limit.jitter_fraction",
                format!("must be within 0.0..=1.0, got {}", self.jitter_fraction),
            ));
        }
        if !(self.buffer_factor >= 1.0) {
            return Err(ConfigError::invalid(
                "rate_limit.buffer_factor",
                format!("must be >= 1.0, got {}", self.buffer_factor),
            ));
        }
        if !(self.max_backoff_multiplier >= 1.0) {
            return Err(ConfigError::invalid(
                "rate_limit.max_backoff_multiplier",
                format!("must be >= 1.0, got {}", self.max_backoff_multiplier),
            ));
        }
        Ok(())
    }
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub retry_delay_ms: u64,
    /// Growth factor between consecutive retries
    pub backoff_factor: f64,
    /// Ceiling on a single retry delay, in milliseconds
    pub max_backoff_ms: u64,
    /// HTTP statuses worth retrying
    pub retry_statuses: Vec<u16>,
    /// Each delay is stretched by a random fraction up to this value
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_backoff_ms: MAX_BACKOFF_MS,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            jitter_fraction: DEFAULT_RETRY_JITTER,
        }
    }
}

impl RetryConfig {
    /// Reject values the retry handler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backoff_factor.is_finite() && self.backoff_factor >= 1.0) {
            return Err(ConfigError::invalid(
                "retry.backoff_factor",
                format!("must be >= 1.0, got {}", self.backoff_factor),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(ConfigError::invalid(
                "retry.jitter_fraction",
                format!("must be within 0.0..=1.0, got {}", self.jitter_fraction),
            ));
        }
        Ok(())
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// API host, without a trailing slash
    pub base_url: String,
    /// Per-attempt request timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// Per-attempt timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level jcall configuration.
///
/// # Example
///
/// ```no_run
/// use jcall_rate_limit::JCallConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = JCallConfig::load()?;
/// println!("Sustained rate: {}/s", config.rate_limit.rate);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct JCallConfig {
    /// Admission control
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,
    /// HTTP transport
    #[serde(default)]
    pub http: HttpConfig,
}

impl JCallConfig {
    /// Load configuration from a specific file path.
    ///
    /// Sections and fields missing from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> JCallResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                JCallError::from(ConfigError::load(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                JCallError::from(ConfigError::load(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped when absent.
    #[instrument]
    pub fn load() -> JCallResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../jcall.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/jcall/jcall.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("jcall").required(false));

        let config: Self = builder
            .build()
            .map_err(|e| {
                JCallError::from(ConfigError::load(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                JCallError::from(ConfigError::load(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()?;
        self.retry.validate()?;
        if self.http.base_url.is_empty() {
            return Err(ConfigError::invalid("http.base_url", "must not be empty"));
        }
        Ok(())
    }
}
