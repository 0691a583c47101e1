//! Registry credentials.
//!
//! Credentials are configured as an ordered list of registry entries. Each
//! entry's payload is encoded once, at construction, into the form the Docker
//! daemon expects in its `X-Registry-Auth` header: the JSON `AuthConfig`
//! document, base64 encoded.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use berth_common::{BerthError, BerthResult};
use serde::{Deserialize, Serialize};

use crate::reference::ImageReference;

/// Docker `AuthConfig` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password or token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-encoded `user:password` string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Email (optional, for some registries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Server address.
    #[serde(
        default,
        rename = "serveraddress",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_address: Option<String>,
    /// Identity token (for OAuth).
    #[serde(
        default,
        rename = "identitytoken",
        skip_serializing_if = "Option::is_none"
    )]
    pub identity_token: Option<String>,
    /// Bearer token sent straight to the registry.
    #[serde(
        default,
        rename = "registrytoken",
        skip_serializing_if = "Option::is_none"
    )]
    pub registry_token: Option<String>,
}

impl AuthConfig {
    /// Username/password credential.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }
}

/// A configured registry credential entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAuth {
    /// Registry matched exactly against the first segment of an image reference.
    pub registry: String,
    /// Credential payload.
    #[serde(flatten)]
    pub config: AuthConfig,
}

impl RegistryAuth {
    /// Create a new entry.
    pub fn new(registry: impl Into<String>, config: AuthConfig) -> Self {
        Self {
            registry: registry.into(),
            config,
        }
    }
}

/// A credential encoded for transport to the daemon.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedCredential(String);

impl EncodedCredential {
    /// Encode a payload as base64 of its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn encode(config: &AuthConfig) -> BerthResult<Self> {
        let json = serde_json::to_vec(config)?;
        Ok(Self(BASE64.encode(json)))
    }

    /// Decode back into the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not base64 encoded `AuthConfig` JSON.
    pub fn decode(&self) -> BerthResult<AuthConfig> {
        let bytes = BASE64
            .decode(&self.0)
            .map_err(|e| BerthError::Serialization(format!("Invalid base64 credential: {e}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The encoded string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncodedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodedCredential(<redacted>)")
    }
}

/// Looks up the credential for an image.
///
/// Immutable once built and cheap to share between tasks.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    /// Entries in configured order.
    entries: Vec<(String, EncodedCredential)>,
}

impl CredentialResolver {
    /// Build a resolver, encoding every entry up front.
    ///
    /// # Errors
    ///
    /// Returns [`BerthError::Credential`] naming the first entry that cannot
    /// be encoded. This is a deployment defect and callers should not start.
    pub fn new(auths: impl IntoIterator<Item = RegistryAuth>) -> BerthResult<Self> {
        let entries = auths
            .into_iter()
            .map(|auth| -> BerthResult<(String, EncodedCredential)> {
                let encoded =
                    EncodedCredential::encode(&auth.config).map_err(|e| BerthError::Credential {
                        registry: auth.registry.clone(),
                        message: e.to_string(),
                    })?;
                Ok((auth.registry, encoded))
            })
            .collect::<BerthResult<Vec<_>>>()?;

        tracing::debug!(count = entries.len(), "Registry credentials loaded");
        Ok(Self { entries })
    }

    /// Resolve the credential to pull `image` with.
    ///
    /// Single-segment references (`alpine`, `nginx:1.25`) never get a
    /// credential. Otherwise the first entry whose registry equals the first
    /// segment wins.
    #[must_use]
    pub fn resolve(&self, image: &str) -> Option<&EncodedCredential> {
        self.lookup(image).map(|(_, credential)| credential)
    }

    /// The registry of the entry that [`resolve`](Self::resolve) would use.
    #[must_use]
    pub fn registry_for(&self, image: &str) -> Option<&str> {
        self.lookup(image).map(|(registry, _)| registry.as_str())
    }

    /// Configured registries, in order.
    pub fn registries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(registry, _)| registry.as_str())
    }

    /// Number of configured entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no credentials are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, image: &str) -> Option<&(String, EncodedCredential)> {
        let registry = ImageReference::parse(image).registry()?;
        self.entries.iter().find(|(r, _)| r == registry)
    }
}
