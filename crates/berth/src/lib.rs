//! # berth
//!
//! Single-container lifecycle orchestration against a Docker daemon.
//!
//! berth provides:
//! - Registry credential lookup for image pulls
//! - Pull, create and start of one container from a workload spec
//! - A handle to stop the started container

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod runtime;
pub mod spec;

pub use config::BerthConfig;
pub use container::Container;
pub use error::{DaemonError, LifecycleError, LifecycleResult};
pub use lifecycle::LifecyclePhase;
pub use orchestrator::Orchestrator;
pub use runtime::{ContainerRuntime, DockerRuntime};
pub use spec::{ContainerConfigs, WorkloadSpec};
