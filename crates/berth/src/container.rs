//! Handle to a started container.

use std::sync::{Arc, Weak};

use berth_common::InstanceName;
use chrono::{DateTime, Utc};
use tracing::{Instrument, Span};

use crate::lifecycle::LifecyclePhase;
use crate::runtime::ContainerRuntime;
use crate::spec::WorkloadSpec;

/// A container created and started by [`Orchestrator::start`](crate::Orchestrator::start).
///
/// Handles are only built after the daemon accepted both create and start,
/// so `id` and `started_at` are always set.
#[derive(Debug)]
pub struct Container {
    id: String,
    name: InstanceName,
    spec: Arc<WorkloadSpec>,
    started_at: DateTime<Utc>,
    stable_at: Option<DateTime<Utc>>,
    phase: LifecyclePhase,
    /// Span the container was started under; carries name and id.
    span: Span,
    /// Not owned: the runtime may be dropped before the handle.
    runtime: Weak<dyn ContainerRuntime>,
}

impl Container {
    pub(crate) fn started(
        id: String,
        name: InstanceName,
        spec: Arc<WorkloadSpec>,
        started_at: DateTime<Utc>,
        span: Span,
        runtime: Weak<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            id,
            name,
            spec,
            started_at,
            stable_at: None,
            phase: LifecyclePhase::Started,
            span,
            runtime,
        }
    }

    /// Daemon-assigned container id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Composed instance name the container was created under.
    #[must_use]
    pub const fn name(&self) -> &InstanceName {
        &self.name
    }

    /// The spec the container was created from.
    #[must_use]
    pub const fn spec(&self) -> &Arc<WorkloadSpec> {
        &self.spec
    }

    /// When the daemon accepted the start call.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the container was promoted to stable, if it has been.
    #[must_use]
    pub const fn stable_at(&self) -> Option<DateTime<Utc>> {
        self.stable_at
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Record that the container is considered healthy.
    ///
    /// The first call wins; later calls return the original timestamp.
    pub fn mark_stable(&mut self) -> DateTime<Utc> {
        *self.stable_at.get_or_insert_with(|| {
            self.span.in_scope(|| tracing::info!("Container stable"));
            Utc::now()
        })
    }

    /// Stop the container, giving it the spec's stop timeout to exit.
    ///
    /// Never fails: a daemon error is logged as a warning and the handle
    /// stays in [`LifecyclePhase::Started`].
    pub async fn stop(&mut self) {
        let timeout = self.spec.stop_timeout();
        let span = self.span.clone();

        let stopped = async {
            tracing::info!(timeout_secs = timeout.as_secs(), "Stop container");

            let Some(runtime) = self.runtime.upgrade() else {
                tracing::warn!("Runtime dropped, cannot stop container");
                return false;
            };

            match runtime.stop_container(&self.id, timeout).await {
                Ok(()) => {
                    tracing::info!("Container stopped");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Error while container stop");
                    false
                }
            }
        }
        .instrument(span)
        .await;

        if stopped {
            self.phase = LifecyclePhase::Stopped;
        }
    }
}
