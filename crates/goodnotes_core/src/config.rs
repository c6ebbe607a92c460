//! Process configuration.
//!
//! # Responsibility
//! - Resolve the data layout (notes tree, index, record files, logs).
//! - Apply `GOODNOTES_*` environment overrides.
//! - Provide the seed values of the settings store.
//!
//! # Invariants
//! - Every path in a resolved config is absolute when the base directory is.
//! - Blank environment values are treated as unset.

use crate::logging::{default_log_level, normalize_level};
use crate::model::settings::Settings;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "GOODNOTES_";
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:9200";

const DEFAULT_BASE_SUBDIR: &str = "Documents/GoodNotes";
const NOTES_DIR_NAME: &str = "notes";
const INDEX_FILE_NAME: &str = "notes_index.yaml";
const ACTION_ITEMS_FILE_NAME: &str = "action_items.yaml";
const SETTINGS_FILE_NAME: &str = "settings.yaml";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    /// No base directory was given and the home directory is unknown.
    HomeDirUnavailable,
    InvalidValue { key: String, value: String },
    CreateDirectory { path: PathBuf, source: io::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomeDirUnavailable => write!(f, "cannot resolve the home directory"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value for {key}: `{value}`")
            }
            Self::CreateDirectory { path, source } => {
                write!(f, "failed to create `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_dir: PathBuf,
    pub notes_dir: PathBuf,
    pub index_file: PathBuf,
    pub action_items_file: PathBuf,
    pub settings_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub search_url: String,
    pub search_enabled: bool,
}

impl AppConfig {
    /// Default layout under `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            notes_dir: base_dir.join(NOTES_DIR_NAME),
            index_file: base_dir.join(INDEX_FILE_NAME),
            action_items_file: base_dir.join(ACTION_ITEMS_FILE_NAME),
            settings_file: base_dir.join(SETTINGS_FILE_NAME),
            log_dir: base_dir.join(LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            search_enabled: false,
            base_dir,
        }
    }

    /// Resolves the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config from an arbitrary variable source.
    ///
    /// `lookup` receives full variable names such as `GOODNOTES_BASE_DIR`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_dir = match var("BASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_base_dir()?,
        };
        let mut config = Self::with_base_dir(base_dir);

        if let Some(dir) = var("NOTES_DIR") {
            config.notes_dir = PathBuf::from(dir);
        }
        if let Some(file) = var("INDEX_FILE") {
            config.index_file = PathBuf::from(file);
        }
        if let Some(file) = var("ACTION_ITEMS_FILE") {
            config.action_items_file = PathBuf::from(file);
        }
        if let Some(file) = var("SETTINGS_FILE") {
            config.settings_file = PathBuf::from(file);
        }
        if let Some(dir) = var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = normalize_level(&level)
                .map_err(|_| ConfigError::InvalidValue {
                    key: format!("{ENV_PREFIX}LOG_LEVEL"),
                    value: level.clone(),
                })?
                .to_string();
        }
        if let Some(url) = var("SEARCH_URL") {
            config.search_url = url;
        }
        if let Some(flag) = var("SEARCH_ENABLED") {
            config.search_enabled =
                parse_bool(&flag).ok_or_else(|| ConfigError::InvalidValue {
                    key: format!("{ENV_PREFIX}SEARCH_ENABLED"),
                    value: flag.clone(),
                })?;
        }
        Ok(config)
    }

    /// Creates the notes directory and the parent of every data file.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        let parents = [
            &self.index_file,
            &self.action_items_file,
            &self.settings_file,
        ]
        .into_iter()
        .filter_map(|file| file.parent());

        for dir in std::iter::once(self.notes_dir.as_path()).chain(parents) {
            create_dir(dir)?;
        }
        Ok(())
    }

    /// Values seeded into a fresh settings file.
    pub fn settings_defaults(&self) -> Settings {
        Settings {
            notes_directory: Some(self.notes_dir.to_string_lossy().into_owned()),
            search_url: Some(self.search_url.clone()),
            search_enabled: self.search_enabled,
        }
    }
}

fn default_base_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_BASE_SUBDIR))
        .ok_or(ConfigError::HomeDirUnavailable)
}

fn create_dir(dir: &Path) -> Result<(), ConfigError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
