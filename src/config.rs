use crate::error::ConfigError;
use crate::service::daily::DEFAULT_MAX_CORRECTION_PASSES;
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "distributor";
const ENV_PREFIX: &str = "DISTRIBUTOR";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub vouchers: VoucherSourceConfig,
    pub distribution: DistributionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listener quota messages and batch requests arrive on, `host:port`
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub name: String,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherSourceConfig {
    pub url: String,
    pub status_code: String,
    pub page_size: usize,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    pub max_correction_passes: usize,
}

/// Raw shape before validation; everything optional so missing keys can be named
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    queue: RawQueue,
    #[serde(default)]
    vouchers: RawVouchers,
    #[serde(default)]
    distribution: RawDistribution,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawQueue {
    name: Option<String>,
    capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVouchers {
    url: Option<String>,
    status_code: Option<String>,
    page_size: Option<usize>,
    max_attempts: Option<u32>,
    backoff_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDistribution {
    max_correction_passes: Option<usize>,
}

impl AppConfig {
    /// Load from `distributor.toml` (optional) and `DISTRIBUTOR_*` environment variables,
    /// e.g. `DISTRIBUTOR_VOUCHERS__PAGE_SIZE=500`.
    pub fn load() -> Result<Self, ConfigError> {
        let source = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_source(source)
    }

    /// Validate an already assembled configuration source.
    pub fn from_source(source: config::Config) -> Result<Self, ConfigError> {
        let raw: RawConfig = source.try_deserialize()?;

        let page_size = required(raw.vouchers.page_size, "vouchers.page_size")?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "vouchers.page_size",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            server: ServerConfig {
                address: required_text(raw.server.address, "server.address")?,
            },
            queue: QueueConfig {
                name: required_text(raw.queue.name, "queue.name")?,
                capacity: raw.queue.capacity.unwrap_or(16),
            },
            vouchers: VoucherSourceConfig {
                url: required_text(raw.vouchers.url, "vouchers.url")?,
                status_code: required_text(raw.vouchers.status_code, "vouchers.status_code")?,
                page_size,
                max_attempts: raw.vouchers.max_attempts.unwrap_or(5),
                backoff_ms: raw.vouchers.backoff_ms.unwrap_or(500),
                timeout_secs: raw.vouchers.timeout_secs.unwrap_or(30),
            },
            distribution: DistributionConfig {
                max_correction_passes: raw
                    .distribution
                    .max_correction_passes
                    .unwrap_or(DEFAULT_MAX_CORRECTION_PASSES),
            },
        })
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(field))
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ConfigError::Missing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> config::Config {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap()
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("server.address", "127.0.0.1:8080"),
        ("queue.name", "request_queue"),
        ("vouchers.url", "http://vouchers.local"),
        ("vouchers.status_code", "2"),
        ("vouchers.page_size", "500"),
    ];

    #[test]
    fn complete_configuration_gets_defaults() {
        let config = AppConfig::from_source(source(COMPLETE)).unwrap();
        assert_eq!(config.vouchers.page_size, 500);
        assert_eq!(config.vouchers.max_attempts, 5);
        assert_eq!(config.queue.capacity, 16);
        assert_eq!(config.distribution.max_correction_passes, DEFAULT_MAX_CORRECTION_PASSES);
    }

    #[test]
    fn every_missing_field_is_named() {
        for skipped in 0..COMPLETE.len() {
            let pairs: Vec<_> = COMPLETE
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skipped)
                .map(|(_, &pair)| pair)
                .collect();
            let err = AppConfig::from_source(source(&pairs)).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("missing required configuration value `{}`", COMPLETE[skipped].0)
            );
        }
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut pairs = COMPLETE.to_vec();
        pairs[4] = ("vouchers.page_size", "0");
        assert!(matches!(
            AppConfig::from_source(source(&pairs)),
            Err(ConfigError::Invalid {
                field: "vouchers.page_size",
                ..
            })
        ));
    }
}
