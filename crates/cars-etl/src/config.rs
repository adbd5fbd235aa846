//! Configuration management

use cars_common::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Default directory scanned for incoming listing files.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default path of the processed-files ledger log.
pub const DEFAULT_LEDGER_PATH: &str = "processed_files.log";

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "cars_etl.db";

/// Default relational sink table name.
pub const DEFAULT_TABLE_NAME: &str = "cars_analysis";

/// Default flat-file sink path.
pub const DEFAULT_OUTPUT_CSV: &str = "cars_transformed.csv";

/// Default directory for post-load summary reports.
pub const DEFAULT_PLOTS_DIR: &str = "plots";

/// Default currency rate endpoint.
pub const DEFAULT_RATE_ENDPOINT: &str = "https://api.frankfurter.app/latest?from=USD&to=INR";

/// Default target currency code looked up in the rate response.
pub const DEFAULT_RATE_CURRENCY: &str = "INR";

/// Default fallback rate used when the endpoint cannot be reached.
pub const DEFAULT_FALLBACK_RATE: f64 = 83.0;

/// Default rate request timeout in seconds.
pub const DEFAULT_RATE_TIMEOUT_SECS: u64 = 10;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Directory scanned for `*.csv` input files
    pub data_dir: PathBuf,

    /// Append-only ledger of fully committed source files
    pub ledger_path: PathBuf,

    /// SQLite database file for the relational sink
    pub database_path: PathBuf,

    /// Table name for the relational sink
    pub table_name: String,

    /// Flat-file sink path
    pub output_csv: PathBuf,

    /// Directory for post-load summary reports
    pub plots_dir: PathBuf,

    /// Rate resolver configuration
    pub rates: RateConfig,
}

/// Currency rate resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// HTTP endpoint returning `{"rates": {"<currency>": <number>}}`
    pub endpoint: String,

    /// Currency code looked up under `rates`
    pub currency: String,

    /// Fixed rate used whenever the endpoint fails
    pub fallback_rate: f64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RateConfig {
    fn default() -> Self {
        RateConfig {
            endpoint: DEFAULT_RATE_ENDPOINT.to_string(),
            currency: DEFAULT_RATE_CURRENCY.to_string(),
            fallback_rate: DEFAULT_FALLBACK_RATE,
            timeout_secs: DEFAULT_RATE_TIMEOUT_SECS,
        }
    }
}

impl RateConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(EtlError::Config("Rate endpoint cannot be empty".to_string()));
        }
        if self.currency.is_empty() {
            return Err(EtlError::Config("Rate currency cannot be empty".to_string()));
        }
        if self.fallback_rate <= 0.0 {
            return Err(EtlError::Config(format!(
                "Fallback rate must be positive, got {}",
                self.fallback_rate
            )));
        }
        if self.timeout_secs == 0 {
            return Err(EtlError::Config("Rate timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            output_csv: PathBuf::from(DEFAULT_OUTPUT_CSV),
            plots_dir: PathBuf::from(DEFAULT_PLOTS_DIR),
            rates: RateConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Load configuration from environment variables and defaults
    ///
    /// - `CARS_DATA_DIR`, `CARS_LEDGER_PATH`, `CARS_DATABASE_PATH`,
    ///   `CARS_TABLE_NAME`, `CARS_OUTPUT_CSV`, `CARS_PLOTS_DIR`
    /// - `CARS_RATE_ENDPOINT`, `CARS_RATE_CURRENCY`,
    ///   `CARS_RATE_FALLBACK`, `CARS_RATE_TIMEOUT_SECS`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = EtlConfig::default();

        if let Ok(dir) = std::env::var("CARS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("CARS_LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("CARS_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(table) = std::env::var("CARS_TABLE_NAME") {
            config.table_name = table;
        }
        if let Ok(path) = std::env::var("CARS_OUTPUT_CSV") {
            config.output_csv = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("CARS_PLOTS_DIR") {
            config.plots_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("CARS_RATE_ENDPOINT") {
            config.rates.endpoint = url;
        }
        if let Ok(currency) = std::env::var("CARS_RATE_CURRENCY") {
            config.rates.currency = currency;
        }
        if let Ok(rate) = std::env::var("CARS_RATE_FALLBACK") {
            config.rates.fallback_rate = rate
                .parse()
                .map_err(|_| EtlError::Config(format!("Invalid CARS_RATE_FALLBACK: {}", rate)))?;
        }
        if let Ok(secs) = std::env::var("CARS_RATE_TIMEOUT_SECS") {
            config.rates.timeout_secs = secs.parse().map_err(|_| {
                EtlError::Config(format!("Invalid CARS_RATE_TIMEOUT_SECS: {}", secs))
            })?;
        }

        config.rates.validate()?;
        Ok(config)
    }

    /// SQLite connection URL for the configured database file,
    /// creating the file on first connect.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path.display())
    }
}
