use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted for a config file when no path is given.
pub const CONFIG_ENV: &str = "TOAST_CENTER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Toast queue settings. Read once when the store is built and never changed
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastConfig {
    /// The maximum number of toasts that can be displayed at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
    /// Default lifetime in milliseconds of a success toast.
    #[serde(default = "default_success_timeout")]
    pub success_timeout: u32,
    /// Default lifetime in milliseconds of an info toast.
    #[serde(default = "default_info_timeout")]
    pub info_timeout: u32,
    /// Default lifetime in milliseconds of a warning toast.
    #[serde(default = "default_warning_timeout")]
    pub warning_timeout: u32,
    /// Default lifetime in milliseconds of an error toast.
    #[serde(default = "default_error_timeout")]
    pub error_timeout: u32,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            success_timeout: default_success_timeout(),
            info_timeout: default_info_timeout(),
            warning_timeout: default_warning_timeout(),
            error_timeout: default_error_timeout(),
        }
    }
}

impl ToastConfig {
    /// Parse a TOML document. Missing keys fall back to their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if given, else from [`CONFIG_ENV`], else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value helpers for serde
const fn default_max_concurrent() -> u32 {
    4
}

const fn default_success_timeout() -> u32 {
    4000
}

const fn default_info_timeout() -> u32 {
    5000
}

const fn default_warning_timeout() -> u32 {
    6000
}

const fn default_error_timeout() -> u32 {
    8000
}
