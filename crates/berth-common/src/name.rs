//! Container naming.
//!
//! Callers address workloads by a logical name (`web`). Every start attempt
//! runs under a composed instance name (`web_XkQzTbWpLa`) so repeated or
//! concurrent attempts never collide at the daemon.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Letters a random suffix is drawn from.
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate `len` ASCII letters from a uniform random source.
///
/// Used only to make names unique, not for anything secret.
#[must_use]
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}

/// A composed, daemon-level container name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceName(String);

impl InstanceName {
    /// Length of the random part of a composed name.
    pub const SUFFIX_LENGTH: usize = 10;

    /// Compose a fresh instance name for `logical`.
    ///
    /// `logical` is taken as given; the daemon decides whether the result is
    /// an acceptable container name.
    #[must_use]
    pub fn compose(logical: &str) -> Self {
        Self(format!("{logical}_{}", random_suffix(Self::SUFFIX_LENGTH)))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The logical name this instance name was composed from.
    #[must_use]
    pub fn logical(&self) -> &str {
        self.0
            .rsplit_once('_')
            .map_or(self.0.as_str(), |(logical, _)| logical)
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InstanceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
