use std::path::{Path, PathBuf};
use std::time::Duration;

use checkin_photos::HttpApiConfig;
use event_auth::AuthServiceConfig;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "rha-checkin";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application settings, read from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Key-value file holding the session token
    pub token_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api/v1".to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            user_agent: format!("rha-checkin/{}", env!("CARGO_PKG_VERSION")),
            token_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let config =
                    Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                log::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|d| d.join(APP_DIR).join("storage.json"))
                .unwrap_or_else(|| PathBuf::from(".rha-checkin-storage.json"))
        })
    }

    pub fn http_api_config(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn auth_service_config(&self) -> AuthServiceConfig {
        AuthServiceConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}
