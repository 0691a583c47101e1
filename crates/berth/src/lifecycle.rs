//! Container lifecycle phases.

/// Phases one logical container moves through.
///
/// `start` walks `Unstarted → Pulling → Created → Started`; a handle only
/// exists once `Started` is reached, and `stop` moves it to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Nothing has been sent to the daemon yet.
    Unstarted,
    /// Image pull in progress.
    Pulling,
    /// Container created but not started.
    Created,
    /// Container running.
    Started,
    /// Container stopped.
    Stopped,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unstarted => write!(f, "unstarted"),
            Self::Pulling => write!(f, "pulling"),
            Self::Created => write!(f, "created"),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
