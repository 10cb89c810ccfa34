//! Settings structs and loading logic.
//!
//! All settings have sensible defaults and can be overridden via
//! environment variables or configuration files.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::types::EventSchema;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Ethereum RPC configuration.
    pub chain: ChainSettings,
    /// Database configuration.
    pub database: DatabaseSettings,
    /// Scan tuning parameters.
    pub scanner: ScannerSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Metrics configuration.
    pub metrics: MetricsSettings,
    /// The contract and event this scan targets.
    pub contract: ContractConfig,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// Files are loaded in this order (later overrides earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (if exists)
    /// 3. Environment variables with `EVMSCAN_` prefix
    ///
    /// # Arguments
    /// * `environment` - Environment name (e.g., "development", "production")
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration is invalid or cannot be loaded.
    pub fn load(environment: &str) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());

        let builder = Config::builder()
            .set_default("chain.rpc_url", "http://localhost:8545")?
            .set_default("chain.chain_id", 1)?
            .set_default("chain.request_timeout_ms", 30000)?
            .set_default("database.url", "postgres://localhost/evmscan")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout_ms", 5000)?
            .set_default("database.idle_timeout_ms", 600_000)?
            .set_default("scanner.min_chunk_size", 10)?
            .set_default("scanner.max_chunk_size", 1000)?
            .set_default("scanner.initial_chunk_size", 20)?
            .set_default("scanner.max_retries", 4)?
            .set_default("scanner.retry_delay_seconds", 12)?
            .set_default("scanner.reorg_safety", 10)?
            .set_default("scanner.poll_interval_seconds", 12)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.file_path", Option::<String>::None)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.host", "0.0.0.0")?
            .set_default("metrics.port", 9090)?
            .set_default("contract.address", "0x0000000000000000000000000000000000000000")?
            .set_default("contract.event_name", "Transfer")?
            .set_default("contract.creation_block", Option::<i64>::None)?
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/{environment}")).required(false))
            .add_source(
                Environment::with_prefix("EVMSCAN")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load settings from a specific file path.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Validate settings and return any validation errors.
    ///
    /// # Errors
    /// Returns a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.chain.rpc_url.is_empty() {
            errors.push("chain.rpc_url cannot be empty".into());
        }
        if self.chain.chain_id == 0 {
            errors.push("chain.chain_id must be non-zero".into());
        }

        if self.database.url.is_empty() {
            errors.push("database.url cannot be empty".into());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be non-zero".into());
        }
        if self.database.min_connections > self.database.max_connections {
            errors.push("database.min_connections cannot exceed max_connections".into());
        }

        if self.scanner.min_chunk_size == 0 {
            errors.push("scanner.min_chunk_size must be non-zero".into());
        }
        if self.scanner.min_chunk_size > self.scanner.max_chunk_size {
            errors.push("scanner.min_chunk_size cannot exceed max_chunk_size".into());
        }
        if self.scanner.initial_chunk_size < self.scanner.min_chunk_size
            || self.scanner.initial_chunk_size > self.scanner.max_chunk_size
        {
            errors.push("scanner.initial_chunk_size must fall within [min_chunk_size, max_chunk_size]".into());
        }
        if self.scanner.max_retries == 0 {
            errors.push("scanner.max_retries must be non-zero".into());
        }

        if EventSchema::from_str(&self.contract.event_name).is_err() {
            errors.push(format!(
                "contract.event_name '{}' is not a recognized event schema",
                self.contract.event_name
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Ethereum RPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,
    /// Chain ID (for validation).
    pub chain_id: u64,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl ChainSettings {
    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
    /// Minimum connections to maintain.
    pub min_connections: u32,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle connection timeout in milliseconds.
    pub idle_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Get the connection timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Scan tuning parameters.
///
/// Defaults mirror a conservative baseline: small chunks, a handful of
/// retries with a fixed backoff, and a ten-block reorg safety margin.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScannerSettings {
    /// Smallest chunk size the adaptive sizer will shrink to.
    pub min_chunk_size: u64,
    /// Largest chunk size the adaptive sizer will grow to.
    pub max_chunk_size: u64,
    /// Chunk size used for the first segment of a scan.
    pub initial_chunk_size: u64,
    /// Maximum retry attempts for a single log fetch before giving up.
    pub max_retries: u32,
    /// Delay between retries, in seconds.
    pub retry_delay_seconds: u64,
    /// Blocks to hold back from the chain tip before treating a block as
    /// final (protects against shallow reorgs).
    pub reorg_safety: u64,
    /// Interval between polls for new blocks in continuous `watch` mode.
    pub poll_interval_seconds: u64,
}

impl ScannerSettings {
    /// Get the retry delay as a `Duration`.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    /// Get the poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
    /// Optional file path for log output.
    pub file_path: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Whether the Prometheus exporter is enabled.
    pub enabled: bool,
    /// Host to bind the metrics server to.
    pub host: String,
    /// Port for the metrics server.
    pub port: u16,
}

impl MetricsSettings {
    /// Get the metrics socket address string.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The single contract and event a scan targets.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Contract address to scan, as a hex string.
    pub address: String,
    /// Event schema name (see [`EventSchema::from_str`]).
    pub event_name: String,
    /// Known creation block, if already discovered; skips the binary
    /// search in [`crate::scanner::CreationLocator`] when set.
    pub creation_block: Option<i64>,
}

impl ContractConfig {
    /// Parse [`Self::address`] into an Alloy address.
    ///
    /// # Errors
    /// Returns an error if the address is malformed.
    pub fn parse_address(&self) -> Result<alloy::primitives::Address, String> {
        alloy::primitives::Address::from_str(&self.address)
            .map_err(|e| format!("invalid address '{}': {e}", self.address))
    }

    /// Parse [`Self::event_name`] into an [`EventSchema`].
    ///
    /// # Errors
    /// Returns an error if the name doesn't match a known schema.
    pub fn parse_event_schema(&self) -> Result<EventSchema, crate::types::UnknownEventSchema> {
        EventSchema::from_str(&self.event_name)
    }

    /// [`Self::creation_block`] as a [`crate::types::BlockNumber`], if set.
    #[must_use]
    pub fn configured_creation_block(&self) -> Option<crate::types::BlockNumber> {
        self.creation_block
            .map(|n| crate::types::BlockNumber::new(n.max(0) as u64))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn chain_request_timeout() {
        let chain = ChainSettings {
            rpc_url: "http://localhost:8545".into(),
            chain_id: 1,
            request_timeout_ms: 30000,
        };
        assert_eq!(chain.request_timeout(), Duration::from_millis(30000));
    }

    #[test]
    fn scanner_durations() {
        let scanner = ScannerSettings {
            min_chunk_size: 10,
            max_chunk_size: 1000,
            initial_chunk_size: 20,
            max_retries: 4,
            retry_delay_seconds: 12,
            reorg_safety: 10,
            poll_interval_seconds: 12,
        };
        assert_eq!(scanner.retry_delay(), Duration::from_secs(12));
        assert_eq!(scanner.poll_interval(), Duration::from_secs(12));
    }

    #[test]
    fn validation_catches_zero_connections() {
        let mut settings = create_valid_settings();
        settings.database.max_connections = 0;

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("max_connections")));
    }

    #[test]
    fn validation_catches_min_exceeds_max_chunk() {
        let mut settings = create_valid_settings();
        settings.scanner.min_chunk_size = 1000;
        settings.scanner.max_chunk_size = 10;

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("chunk_size")));
    }

    #[test]
    fn validation_catches_unknown_event_schema() {
        let mut settings = create_valid_settings();
        settings.contract.event_name = "Approval".into();

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("event_name")));
    }

    fn create_valid_settings() -> Settings {
        Settings {
            chain: ChainSettings {
                rpc_url: "http://localhost:8545".into(),
                chain_id: 1,
                request_timeout_ms: 30000,
            },
            database: DatabaseSettings {
                url: "postgres://localhost/test".into(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_ms: 5000,
                idle_timeout_ms: 600_000,
            },
            scanner: ScannerSettings {
                min_chunk_size: 10,
                max_chunk_size: 1000,
                initial_chunk_size: 20,
                max_retries: 4,
                retry_delay_seconds: 12,
                reorg_safety: 10,
                poll_interval_seconds: 12,
            },
            logging: LoggingSettings {
                level: "info".into(),
                format: "json".into(),
                file_path: None,
            },
            metrics: MetricsSettings {
                enabled: true,
                host: "0.0.0.0".into(),
                port: 9090,
            },
            contract: ContractConfig {
                address: "0x0000000000000000000000000000000000000001".into(),
                event_name: "Transfer".into(),
                creation_block: None,
            },
        }
    }
}
