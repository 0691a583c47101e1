//! berth configuration file.

use std::path::{Path, PathBuf};

use berth_common::{BerthError, BerthResult};
use berth_image::{CredentialResolver, RegistryAuth};
use serde::{Deserialize, Serialize};

/// Process-wide configuration (config.toml).
///
/// ```toml
/// [[auths]]
/// registry = "myregistry.example"
/// username = "deploy"
/// password = "s3cret"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BerthConfig {
    /// Registry credentials, in lookup order.
    #[serde(default)]
    pub auths: Vec<RegistryAuth>,
}

impl BerthConfig {
    /// Parse from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`BerthError::Config`] if the document is not valid.
    pub fn from_toml(content: &str) -> BerthResult<Self> {
        toml::from_str(content).map_err(|e| BerthError::Config {
            message: format!("Failed to parse config: {e}"),
        })
    }

    /// Load from `path`. A missing file is an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> BerthResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), auths = config.auths.len(), "Loaded config");
        Ok(config)
    }

    /// Default path (`~/.config/berth/config.toml` on Linux).
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("berth")
            .join("config.toml")
    }

    /// Build the credential resolver from the configured auths.
    ///
    /// # Errors
    ///
    /// Returns an error if any credential cannot be encoded.
    pub fn credential_resolver(&self) -> BerthResult<CredentialResolver> {
        CredentialResolver::new(self.auths.iter().cloned())
    }
}
