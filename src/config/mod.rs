//! Configuration loading and validation for the scanner.
//!
//! Configuration is loaded from multiple sources in order of precedence:
//! 1. Environment variables (highest)
//! 2. Environment-specific file (e.g., `development.toml`)
//! 3. Default file (`default.toml`)
//!
//! # Example
//!
//! ```ignore
//! use evmscan::config::Settings;
//!
//! let settings = Settings::load("development")?;
//! println!("RPC URL: {}", settings.chain.rpc_url);
//! ```

mod settings;

pub use settings::{
    ChainSettings, ContractConfig, DatabaseSettings, LoggingSettings, MetricsSettings,
    ScannerSettings, Settings,
};
