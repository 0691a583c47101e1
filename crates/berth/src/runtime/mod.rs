//! Container runtime adapters.
//!
//! The orchestrator never talks to the daemon directly; it goes through a
//! [`ContainerRuntime`], which holds the daemon connection and the credential
//! set. [`DockerRuntime`] is the production implementation.

mod docker;

use std::time::Duration;

use async_trait::async_trait;
use berth_image::{CredentialResolver, EncodedCredential};

use crate::error::LifecycleResult;
use crate::spec::ContainerConfigs;

pub use docker::DockerRuntime;

/// Primitive daemon operations used by the orchestrator.
///
/// Implementations are shared behind an `Arc` and must be safe for
/// concurrent use. Daemon errors are returned as they came.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Registry credentials this runtime pulls with.
    fn credentials(&self) -> &CredentialResolver;

    /// Pull `image`, draining the progress stream before returning.
    async fn pull_image(
        &self,
        image: &str,
        credential: Option<&EncodedCredential>,
    ) -> LifecycleResult<()>;

    /// Force-remove any container called `name`.
    ///
    /// Best effort: failures, including "no such container", are swallowed.
    async fn remove_container_if_exists(&self, name: &str);

    /// Create a container called `name`, returning its id.
    async fn create_container(&self, name: &str, configs: &ContainerConfigs)
    -> LifecycleResult<String>;

    /// Start a created container.
    async fn start_container(&self, id: &str) -> LifecycleResult<()>;

    /// Stop a container, giving it `timeout` before it is killed.
    async fn stop_container(&self, id: &str, timeout: Duration) -> LifecycleResult<()>;
}
