//! Configuration for the Tandem service.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Bundled defaults (include_str! from tandem.toml)
//! 2. User config in home directory (~/.config/tandem/tandem.toml)
//! 3. User config in current directory (./tandem.toml)
//! 4. An explicit file, e.g. from `--config`
//! 5. `TANDEM_`-prefixed environment variables, with `__` between section
//!    and key (`TANDEM_STORAGE__BASE_DIR=/srv/files`)

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tandem_error::{ConfigError, TandemError, TandemResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../tandem.toml");

/// Content store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Getters)]
pub struct StorageConfig {
    /// Directory holding file contents
    base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./static"),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Getters)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pool_size: u32,
}

fn default_pool_size() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Getters)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    level: String,

    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Top-level Tandem configuration.
///
/// # Example
///
/// ```no_run
/// use tandem::TandemConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TandemConfig::load(None)?;
/// println!("Files live in {}", config.storage().base_dir().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize, Getters)]
pub struct TandemConfig {
    /// Content store settings
    #[serde(default)]
    storage: StorageConfig,

    /// Record store settings
    #[serde(default)]
    database: DatabaseConfig,

    /// Log output settings
    #[serde(default)]
    logging: LoggingConfig,
}

impl TandemConfig {
    /// Load configuration from a single file, without defaults or overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TandemResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                TandemError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TandemError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load the layered configuration, reading overrides from the process
    /// environment.
    ///
    /// `explicit` is a file that must exist, typically from `--config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed, `explicit` does not exist,
    /// or a value has the wrong type.
    pub fn load(explicit: Option<&Path>) -> TandemResult<Self> {
        Self::load_with_env(explicit, environment())
    }

    /// Like [`load`](Self::load) with a caller-supplied environment source.
    #[instrument(skip(env))]
    pub fn load_with_env(explicit: Option<&Path>, env: Environment) -> TandemResult<Self> {
        debug!("Loading configuration with precedence: env > explicit > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tandem/tandem.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("tandem").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(env)
            .build()
            .map_err(|e| {
                TandemError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TandemError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Connection string for the record store.
    ///
    /// Uses `database.url` when set, otherwise `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither is set.
    pub fn database_url(&self) -> TandemResult<String> {
        match &self.database.url {
            Some(url) => Ok(url.clone()),
            None => Ok(tandem_database::database_url_from_env()?),
        }
    }

    /// Replace the content store directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.storage.base_dir = base_dir.into();
        self
    }
}

/// `TANDEM_`-prefixed environment variables, `__` between path segments.
pub fn environment() -> Environment {
    Environment::with_prefix("TANDEM")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
