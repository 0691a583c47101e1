//! Common error types for berth.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`BerthError`].
pub type BerthResult<T> = Result<T, BerthError>;

/// Common errors across berth crates.
#[derive(Error, Diagnostic, Debug)]
pub enum BerthError {
    /// The workload spec cannot be turned into a runtime configuration.
    #[error("Invalid workload spec: {message}")]
    #[diagnostic(code(berth::spec::invalid))]
    InvalidSpec {
        /// What is wrong with the spec.
        message: String,
    },

    /// A registry credential could not be encoded or decoded.
    #[error("Malformed credential for registry {registry}: {message}")]
    #[diagnostic(
        code(berth::credential::malformed),
        help("Check the [[auths]] entries of the berth configuration file")
    )]
    Credential {
        /// Registry the credential belongs to.
        registry: String,
        /// The underlying problem.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(berth::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(berth::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(berth::serialization))]
    Serialization(String),
}

impl From<serde_json::Error> for BerthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
