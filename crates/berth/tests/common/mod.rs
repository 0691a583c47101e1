//! In-memory runtime that records daemon calls.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use berth::{ContainerConfigs, ContainerRuntime, DaemonError, LifecycleResult};
use berth_image::{CredentialResolver, EncodedCredential};

/// One recorded daemon call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Pull {
        image: String,
        credential: Option<EncodedCredential>,
    },
    Remove {
        name: String,
    },
    Create {
        name: String,
        image: Option<String>,
    },
    Start {
        id: String,
    },
    Stop {
        id: String,
        timeout: Duration,
    },
}

/// Step the fake should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pull,
    Create,
    Start,
    Stop,
}

#[derive(Debug, Default)]
pub struct FakeRuntime {
    credentials: CredentialResolver,
    failing: Vec<Step>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRuntime {
    pub fn new(credentials: CredentialResolver) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    pub fn failing(mut self, step: Step) -> Self {
        self.failing.push(step);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, step: Step) -> LifecycleResult<()> {
        if self.failing.contains(&step) {
            return Err(daemon_error(&format!("{step:?} failed")).into());
        }
        Ok(())
    }
}

pub fn daemon_error(message: &str) -> DaemonError {
    DaemonError::DockerResponseServerError {
        status_code: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    async fn pull_image(
        &self,
        image: &str,
        credential: Option<&EncodedCredential>,
    ) -> LifecycleResult<()> {
        self.record(Call::Pull {
            image: image.to_string(),
            credential: credential.cloned(),
        });
        self.check(Step::Pull)
    }

    async fn remove_container_if_exists(&self, name: &str) {
        self.record(Call::Remove {
            name: name.to_string(),
        });
    }

    async fn create_container(
        &self,
        name: &str,
        configs: &ContainerConfigs,
    ) -> LifecycleResult<String> {
        self.record(Call::Create {
            name: name.to_string(),
            image: configs.config.image.clone(),
        });
        self.check(Step::Create)?;
        Ok(format!("id-{name}"))
    }

    async fn start_container(&self, id: &str) -> LifecycleResult<()> {
        self.record(Call::Start { id: id.to_string() });
        self.check(Step::Start)
    }

    async fn stop_container(&self, id: &str, timeout: Duration) -> LifecycleResult<()> {
        self.record(Call::Stop {
            id: id.to_string(),
            timeout,
        });
        self.check(Step::Stop)
    }
}
