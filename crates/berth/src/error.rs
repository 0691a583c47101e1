//! Lifecycle errors.

use berth_common::BerthError;
use miette::Diagnostic;
use thiserror::Error;

/// Error returned by the container daemon.
pub type DaemonError = bollard::errors::Error;

/// Result type alias using [`LifecycleError`].
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors that abort a lifecycle operation.
#[derive(Error, Diagnostic, Debug)]
pub enum LifecycleError {
    /// The request was rejected before reaching the daemon.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] BerthError),

    /// The daemon failed the call. Carried verbatim.
    #[error(transparent)]
    #[diagnostic(code(berth::daemon))]
    Daemon(#[from] DaemonError),
}

impl LifecycleError {
    /// The daemon error, if this came from the daemon.
    #[must_use]
    pub const fn as_daemon(&self) -> Option<&DaemonError> {
        match self {
            Self::Daemon(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
