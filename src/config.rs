use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub homestay_admin: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const HOMESTAY_ADMIN_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            homestay_admin: Self::HOMESTAY_ADMIN_LEVEL.to_string(),
        }
    }

    /// flexi_logger spec string, e.g. `homestay_admin=info`
    pub fn log_spec(&self) -> String {
        format!("homestay_admin={}", self.homestay_admin)
    }

    fn ensure_valid(&mut self) {
        let str_original = self.homestay_admin.clone();
        self.homestay_admin = self.homestay_admin.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.homestay_admin.as_str()) {
            eprintln!(
                "Config error: homestay_admin log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::HOMESTAY_ADMIN_LEVEL
            );
            self.homestay_admin = Self::HOMESTAY_ADMIN_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Empty means `homestay.db` in the data directory
    #[serde(default)]
    path: String,
    busy_timeout_ms: u64,
}

impl DatabaseConfig {
    const DB_FILENAME: &str = "homestay.db";
    const BUSY_TIMEOUT_MS: u64 = 5000;

    fn default() -> Self {
        DatabaseConfig {
            path: String::new(),
            busy_timeout_ms: Self::BUSY_TIMEOUT_MS,
        }
    }

    /// The configured path, or `homestay.db` under `data_dir` when none is set.
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        if self.path.is_empty() {
            data_dir.join(Self::DB_FILENAME)
        } else {
            PathBuf::from(&self.path)
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    fn ensure_valid(&mut self) {
        self.path = self.path.trim().to_owned();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthConfig {
    bcrypt_cost: u32,
}

impl AuthConfig {
    const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
    const MIN_COST: u32 = 4;
    const MAX_COST: u32 = 31;

    fn default() -> Self {
        AuthConfig {
            bcrypt_cost: Self::BCRYPT_COST,
        }
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    fn ensure_valid(&mut self) {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&self.bcrypt_cost) {
            eprintln!(
                "Config error: bcrypt_cost of '{}' is outside {}..={} - using default of '{}'",
                self.bcrypt_cost,
                Self::MIN_COST,
                Self::MAX_COST,
                Self::BCRYPT_COST
            );
            self.bcrypt_cost = Self::BCRYPT_COST;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl Config {
    const ENV_PREFIX: &str = "HOMESTAY_ADMIN_";

    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    /// Loads the configuration from `config.toml` in the app's data directory.
    /// If the file is missing or fails to parse, defaults are used.
    /// Writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        if !config_path.exists() {
            Self::write_default(&config_path);
        }

        Self::load_from(&config_path)
    }

    /// Defaults, then the TOML file at `config_path`, then `HOMESTAY_ADMIN_*`
    /// environment variables (`__` separates nested keys).
    pub fn load_from(config_path: &Path) -> Self {
        let default_config = Self::default();

        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn write_default(config_path: &Path) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(&Self::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.database.ensure_valid();
        self.auth.ensure_valid();
    }
}
