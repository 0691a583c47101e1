//! Single-container lifecycle orchestrator.

use std::sync::Arc;

use berth_common::InstanceName;
use chrono::Utc;
use tracing::Instrument;

use crate::container::Container;
use crate::error::LifecycleResult;
use crate::lifecycle::LifecyclePhase;
use crate::runtime::ContainerRuntime;
use crate::spec::WorkloadSpec;

/// Drives pull, create and start for one workload at a time.
///
/// The orchestrator holds no per-container state, so concurrent `start`
/// calls proceed independently; the daemon arbitrates shared resources
/// such as the image cache.
#[derive(Clone)]
pub struct Orchestrator {
    runtime: Arc<dyn ContainerRuntime>,
}

impl Orchestrator {
    /// Create a new orchestrator over `runtime`.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// The runtime this orchestrator drives.
    #[must_use]
    pub const fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    /// Pull, create and start a container for `spec` under logical `name`.
    ///
    /// Steps run strictly in order and the first failure is returned as is.
    /// `name` is not checked locally: a name the daemon refuses fails create.
    /// Nothing is rolled back: if start fails after create succeeded, the
    /// created container stays on the daemon. Its name carries a random
    /// suffix, so a later start for the same logical name does not collide.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Invalid`](crate::LifecycleError::Invalid) if
    /// `spec` cannot be turned into a container configuration (no daemon call
    /// is made), or
    /// [`LifecycleError::Daemon`](crate::LifecycleError::Daemon) with the
    /// daemon's error from pull, create or start.
    pub async fn start(&self, name: &str, spec: Arc<WorkloadSpec>) -> LifecycleResult<Container> {
        let span = tracing::info_span!(
            "container",
            container = %name,
            id = tracing::field::Empty
        );

        self.start_inner(name, spec, span.clone())
            .instrument(span)
            .await
    }

    async fn start_inner(
        &self,
        name: &str,
        spec: Arc<WorkloadSpec>,
        span: tracing::Span,
    ) -> LifecycleResult<Container> {
        tracing::info!("Start container");

        let configs = spec.container_configs()?;
        tracing::debug!(?configs, "Container config");

        // Pull exactly what create will ask for.
        let image = configs.config.image.as_deref().unwrap_or_default();
        let credential = self.runtime.credentials().resolve(image);
        tracing::debug!(phase = %LifecyclePhase::Pulling, "Lifecycle transition");
        tracing::info!(image, authenticated = credential.is_some(), "Image pull");
        self.runtime.pull_image(image, credential).await?;
        tracing::info!(image, "Image pulled");

        let instance = InstanceName::compose(name);
        self.runtime
            .remove_container_if_exists(instance.as_str())
            .await;

        let id = self
            .runtime
            .create_container(instance.as_str(), &configs)
            .await?;
        span.record("id", id.as_str());
        tracing::debug!(phase = %LifecyclePhase::Created, "Lifecycle transition");
        tracing::info!(instance = %instance, "Container created");

        self.runtime.start_container(&id).await?;
        let started_at = Utc::now();
        tracing::debug!(phase = %LifecyclePhase::Started, "Lifecycle transition");
        tracing::info!("Container started");

        Ok(Container::started(
            id,
            instance,
            spec,
            started_at,
            span,
            Arc::downgrade(&self.runtime),
        ))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registries", &self.runtime.credentials().len())
            .finish_non_exhaustive()
    }
}
