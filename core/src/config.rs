use std::{env, fs, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_max_backups")]
    pub default_max_backups: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            data_dir: default_data_dir(),
            backup_dir: default_backup_dir(),
            static_dir: default_static_dir(),
            default_max_backups: default_max_backups(),
        }
    }
}

impl AppConfig {
    const CONFIG_ENV: &'static str = "ROSTERD_CONFIG_FILE";
    const BIND_ADDRESS_ENV: &'static str = "ROSTERD_BIND_ADDRESS";
    const DATA_DIR_ENV: &'static str = "ROSTERD_DATA_DIR";
    const BACKUP_DIR_ENV: &'static str = "ROSTERD_BACKUP_DIR";
    const STATIC_DIR_ENV: &'static str = "ROSTERD_STATIC_DIR";
    const MAX_BACKUPS_ENV: &'static str = "ROSTERD_DEFAULT_MAX_BACKUPS";

    /// Load configuration from defaults layered with optional config files and
    /// environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::resolve_config_path(config_path)? {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let file_config: Self = toml::from_str(&contents)
                .with_context(|| format!("invalid config file: {}", path.display()))?;

            config = file_config;
        }

        if let Ok(addr) = env::var(Self::BIND_ADDRESS_ENV) {
            config.bind_address = addr
                .parse()
                .with_context(|| format!("invalid {name}", name = Self::BIND_ADDRESS_ENV))?;
        }

        if let Ok(path) = env::var(Self::DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(path);
        }

        if let Ok(path) = env::var(Self::BACKUP_DIR_ENV) {
            config.backup_dir = PathBuf::from(path);
        }

        if let Ok(path) = env::var(Self::STATIC_DIR_ENV) {
            config.static_dir = PathBuf::from(path);
        }

        if let Ok(count) = env::var(Self::MAX_BACKUPS_ENV) {
            config.default_max_backups = count
                .trim()
                .parse()
                .with_context(|| format!("invalid {name}", name = Self::MAX_BACKUPS_ENV))?;
        }

        if config.default_max_backups == 0 {
            return Err(anyhow!("default_max_backups must be positive"));
        }

        Ok(config)
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            return Self::validate_path(path);
        }

        if let Ok(path) = env::var(Self::CONFIG_ENV) {
            return Self::validate_path(PathBuf::from(path));
        }

        let mut candidates = vec![PathBuf::from("rosterd.toml")];
        if let Some(dir) = Self::default_config_dir() {
            candidates.push(dir.join("config.toml"));
        }

        for candidate in candidates {
            if candidate.exists() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    fn validate_path(path: PathBuf) -> Result<Option<PathBuf>> {
        if path.exists() {
            Ok(Some(path))
        } else {
            Err(anyhow!(
                "configuration file does not exist: {}",
                path.display()
            ))
        }
    }

    fn default_config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".rosterd"))
    }
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:8080"
        .parse()
        .expect("default bind address must be valid")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("./data/backups")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_max_backups() -> usize {
    10
}

fn home_dir() -> Option<PathBuf> {
    if let Some(path) = env::var_os("HOME") {
        return Some(PathBuf::from(path));
    }

    if let Some(path) = env::var_os("USERPROFILE") {
        return Some(PathBuf::from(path));
    }

    None
}
