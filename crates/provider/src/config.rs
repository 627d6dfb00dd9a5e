//! Provider configuration via `kvlink.toml`
//!
//! A provider reads its settings from a small TOML file. A default file is
//! written on first use; to change settings, edit it and re-register the
//! provider.

use std::path::{Path, PathBuf};

use kvlink_core::{Error, Limits, Result};
use serde::{Deserialize, Serialize};

/// Config file name placed in the provider's root directory.
pub const CONFIG_FILE_NAME: &str = "kvlink.toml";

/// Provider configuration loaded from `kvlink.toml`.
///
/// # Example
///
/// ```toml
/// default_root = "/var/lib/kvlink"
/// accept_migrations = true
///
/// [limits]
/// max_key_bytes = 65536
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Directory used for persistent databases when `add_database` is given
    /// an empty path.
    #[serde(default = "default_root")]
    pub default_root: PathBuf,
    /// Whether this provider accepts databases migrated from other providers.
    #[serde(default = "default_accept_migrations")]
    pub accept_migrations: bool,
    /// Size limits enforced on every request.
    #[serde(default)]
    pub limits: Limits,
}

fn default_root() -> PathBuf {
    std::env::temp_dir().join("kvlink")
}

fn default_accept_migrations() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default_root: default_root(),
            accept_migrations: default_accept_migrations(),
            limits: Limits::default(),
        }
    }
}

impl ProviderConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            default_root: root.into(),
            ..Self::default()
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kvlink provider configuration
#
# Directory for persistent databases (log, embedded_btree) when a database is
# added without an explicit path. Defaults to <tmp>/kvlink.
# default_root = "/var/lib/kvlink"

# Accept databases migrated in from other providers (default: true)
accept_migrations = true

# Size limits enforced before a request reaches a database.
[limits]
max_key_bytes = 65536
max_value_bytes = 16777216
max_batch_len = 65536
max_scan_keys = 65536
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            reason: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| Error::InvalidArgument {
            reason: format!("Failed to parse config file '{}': {}", path.display(), e),
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, Self::default_toml()).map_err(|e| Error::Io {
                reason: format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ),
            })?;
        }
        Ok(())
    }

    /// Load `kvlink.toml` from `dir`, creating the default file first if it
    /// does not exist. A file without `default_root` is rooted at `dir`.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::from_file(&path)?;
        if !content
            .lines()
            .any(|l| l.trim_start().starts_with("default_root"))
        {
            config.default_root = dir.to_path_buf();
        }
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| Error::Io {
            reason: format!("Failed to write config file '{}': {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_parses_correctly() {
        let config: ProviderConfig = toml::from_str(ProviderConfig::default_toml()).unwrap();
        assert!(config.accept_migrations);
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.default_root, default_root());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        ProviderConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        let config = ProviderConfig::from_file(&path).unwrap();
        assert!(config.accept_migrations);
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "accept_migrations = false\n").unwrap();

        ProviderConfig::write_default_if_missing(&path).unwrap();
        let config = ProviderConfig::from_file(&path).unwrap();
        assert!(!config.accept_migrations);
    }

    #[test]
    fn partial_limits_use_defaults() {
        let config: ProviderConfig = toml::from_str("[limits]\nmax_key_bytes = 8\n").unwrap();
        assert_eq!(config.limits.max_key_bytes, 8);
        assert_eq!(config.limits.max_value_bytes, Limits::default().max_value_bytes);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "accept_migrations = \"maybe\"\n").unwrap();
        assert!(matches!(
            ProviderConfig::from_file(&path),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn load_or_create_roots_at_directory() {
        let dir = TempDir::new().unwrap();
        let config = ProviderConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config.default_root, dir.path());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = ProviderConfig {
            default_root: PathBuf::from("/data/kv"),
            accept_migrations: false,
            limits: Limits::with_small_limits(),
        };
        config.write_to_file(&path).unwrap();
        assert_eq!(ProviderConfig::from_file(&path).unwrap(), config);
    }
}
