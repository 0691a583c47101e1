//! Docker daemon adapter.

use std::time::Duration;

use async_trait::async_trait;
use berth_common::BerthResult;
use berth_image::{CredentialResolver, EncodedCredential, ImageReference};
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::container::{
    CreateContainerOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use futures::TryStreamExt;

use super::ContainerRuntime;
use crate::error::LifecycleResult;
use crate::spec::ContainerConfigs;

/// [`ContainerRuntime`] backed by a Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    credentials: CredentialResolver,
}

impl DockerRuntime {
    /// Connect to the daemon named by the environment (`DOCKER_HOST`, or the
    /// local default socket) and check that it answers.
    ///
    /// # Errors
    ///
    /// Returns the daemon error if the connection cannot be set up or the
    /// daemon does not respond to a ping.
    pub async fn connect(credentials: CredentialResolver) -> LifecycleResult<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        let version = docker.ping().await?;
        tracing::debug!(response = %version, registries = credentials.len(), "Connected to Docker daemon");

        Ok(Self {
            docker,
            credentials,
        })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(docker: Docker, credentials: CredentialResolver) -> Self {
        Self {
            docker,
            credentials,
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    async fn pull_image(
        &self,
        image: &str,
        credential: Option<&EncodedCredential>,
    ) -> LifecycleResult<()> {
        let reference = ImageReference::parse(image);
        let options = CreateImageOptions {
            from_image: reference.name().to_string(),
            tag: reference.pull_tag().to_string(),
            ..Default::default()
        };
        let credentials = credential.map(docker_credentials).transpose()?;

        let mut stream = std::pin::pin!(self.docker.create_image(Some(options), None, credentials));
        while let Some(progress) = stream.try_next().await? {
            tracing::trace!(status = ?progress.status, "Pull progress");
        }
        Ok(())
    }

    async fn remove_container_if_exists(&self, name: &str) {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        // Usually there is nothing to remove.
        let _ = self.docker.remove_container(name, Some(options)).await;
    }

    async fn create_container(
        &self,
        name: &str,
        configs: &ContainerConfigs,
    ) -> LifecycleResult<String> {
        let mut config = configs.config.clone();
        config.host_config = Some(configs.host_config.clone());
        config.networking_config.clone_from(&configs.networking_config);

        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };
        let created = self.docker.create_container(Some(options), config).await?;
        for warning in &created.warnings {
            tracing::warn!(container = %name, warning = %warning, "Daemon warning on create");
        }
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> LifecycleResult<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn stop_container(&self, id: &str, timeout: Duration) -> LifecycleResult<()> {
        let options = StopContainerOptions {
            t: i64::try_from(timeout.as_secs()).unwrap_or(i64::MAX),
        };
        self.docker.stop_container(id, Some(options)).await?;
        Ok(())
    }
}

/// Turn an encoded credential back into the form bollard sends.
fn docker_credentials(credential: &EncodedCredential) -> BerthResult<DockerCredentials> {
    let auth = credential.decode()?;

    Ok(DockerCredentials {
        username: auth.username,
        password: auth.password,
        auth: auth.auth,
        email: auth.email,
        serveraddress: auth.server_address,
        identitytoken: auth.identity_token,
        registrytoken: auth.registry_token,
    })
}
