use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding encrypted documents and session registries
    pub data_dir: PathBuf,
    /// Fingerprint of the local encryption identity
    pub identity: Option<String>,
    /// Base URL of the sync remote
    pub remote: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            data_dir: PathBuf::from(&home).join(".tagvault"),
            identity: None,
            remote: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        // Apply environment variable overrides
        if let Ok(data_dir) = std::env::var("TAGVAULT_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(identity) = std::env::var("TAGVAULT_IDENTITY") {
            config.identity = Some(identity);
        }
        if let Ok(remote) = std::env::var("TAGVAULT_REMOTE") {
            config.remote = Some(remote);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/tagvault/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("tagvault")
            .join("config.yaml")
    }

    /// The identity fingerprint, or an error naming the fix.
    pub fn require_identity(&self) -> Result<&str, ConfigError> {
        self.identity
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingIdentity)
    }

    /// The remote URL, or an error naming the fix.
    pub fn require_remote(&self) -> Result<&str, ConfigError> {
        self.remote
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingRemote)
    }

    /// Encrypted document file for `identity`: `<data_dir>/<identity>.tag`
    pub fn document_path(&self, identity: &str) -> PathBuf {
        self.data_dir.join(format!("{}.tag", identity))
    }

    /// Encrypted session registry file for `identity`.
    pub fn registry_path(&self, identity: &str) -> PathBuf {
        crate::registry::RemoteRegistry::path_for(&self.data_dir, identity)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    MissingIdentity,
    MissingRemote,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
            ConfigError::MissingIdentity => {
                write!(
                    f,
                    "No identity configured. Set 'identity' in the config file or TAGVAULT_IDENTITY"
                )
            }
            ConfigError::MissingRemote => {
                write!(
                    f,
                    "No remote configured. Set 'remote' in the config file or TAGVAULT_REMOTE"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
