//! Integration tests for the start/stop lifecycle against a fake runtime.

mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use berth::{ContainerRuntime, LifecycleError, LifecyclePhase, Orchestrator, WorkloadSpec};
use berth_common::InstanceName;
use berth_image::{AuthConfig, CredentialResolver, RegistryAuth};
use chrono::Utc;
use common::{Call, FakeRuntime, Step};

fn resolver() -> CredentialResolver {
    CredentialResolver::new([RegistryAuth::new(
        "myregistry.example",
        AuthConfig::basic("deploy", "s3cret"),
    )])
    .unwrap()
}

fn setup(runtime: FakeRuntime) -> (Arc<FakeRuntime>, Orchestrator) {
    let runtime = Arc::new(runtime);
    let orchestrator = Orchestrator::new(runtime.clone() as Arc<dyn ContainerRuntime>);
    (runtime, orchestrator)
}

fn web_spec() -> Arc<WorkloadSpec> {
    let mut spec = WorkloadSpec::new("myregistry.example/app:1");
    spec.stop_timeout = 30;
    Arc::new(spec)
}

#[tokio::test]
async fn test_start_then_stop() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));
    let spec = web_spec();

    let before = Utc::now();
    let mut container = orchestrator.start("web", spec.clone()).await?;
    assert_eq!(container.name().logical(), "web");
    assert_eq!(container.phase(), LifecyclePhase::Started);
    assert!(container.stable_at().is_none());
    assert!(container.started_at() >= before);
    assert!(Arc::ptr_eq(container.spec(), &spec));

    let name = container.name().as_str().to_string();
    let suffix = name.strip_prefix("web_").ok_or("name lacks logical prefix")?;
    assert_eq!(suffix.len(), InstanceName::SUFFIX_LENGTH);
    assert!(suffix.chars().all(|c| c.is_ascii_alphabetic()));
    let id = container.id().to_string();
    assert_eq!(id, format!("id-{name}"));

    let expected_credential = runtime.credentials().resolve("myregistry.example/app:1").cloned();
    assert!(expected_credential.is_some());
    assert_eq!(
        runtime.calls(),
        vec![
            Call::Pull {
                image: "myregistry.example/app:1".to_string(),
                credential: expected_credential,
            },
            Call::Remove { name: name.clone() },
            Call::Create {
                name,
                image: Some("myregistry.example/app:1".to_string()),
            },
            Call::Start { id: id.clone() },
        ]
    );

    container.stop().await;
    assert_eq!(container.phase(), LifecyclePhase::Stopped);
    assert_eq!(
        runtime.calls().last(),
        Some(&Call::Stop {
            id,
            timeout: Duration::from_secs(30),
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_unqualified_image_pulls_anonymously() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    orchestrator
        .start("cache", Arc::new(WorkloadSpec::new("redis:7")))
        .await?;

    assert_eq!(
        runtime.calls()[0],
        Call::Pull {
            image: "redis:7".to_string(),
            credential: None,
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_registry_pulls_anonymously() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    orchestrator
        .start("app", Arc::new(WorkloadSpec::new("ghcr.io/org/app:1")))
        .await?;

    assert!(matches!(
        &runtime.calls()[0],
        Call::Pull { credential: None, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_repeated_starts_get_distinct_names() -> Result<(), Box<dyn Error>> {
    let (_runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    let first = orchestrator.start("web", web_spec()).await?;
    let second = orchestrator.start("web", web_spec()).await?;

    assert_ne!(first.name(), second.name());
    assert_ne!(first.id(), second.id());
    assert_eq!(first.name().logical(), second.name().logical());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_starts() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    let (a, b) = tokio::join!(
        orchestrator.start("web", web_spec()),
        orchestrator.start("worker", web_spec()),
    );
    assert_eq!(a?.name().logical(), "web");
    assert_eq!(b?.name().logical(), "worker");

    let starts = runtime
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Start { .. }))
        .count();
    assert_eq!(starts, 2);
    Ok(())
}

#[tokio::test]
async fn test_pull_failure_stops_before_create() {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()).failing(Step::Pull));

    let err = orchestrator.start("web", web_spec()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Daemon(_)));
    assert_eq!(err.to_string(), common::daemon_error("Pull failed").to_string());

    let calls = runtime.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::Pull { .. }));
}

#[tokio::test]
async fn test_create_failure_returns_daemon_error() {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()).failing(Step::Create));

    let err = orchestrator.start("web", web_spec()).await.unwrap_err();
    assert!(err.as_daemon().is_some());
    assert!(!runtime.calls().iter().any(|c| matches!(c, Call::Start { .. })));
}

#[tokio::test]
async fn test_start_failure_returns_no_handle() {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()).failing(Step::Start));

    let err = orchestrator.start("web", web_spec()).await.unwrap_err();
    assert!(err.as_daemon().is_some());

    // The created container is left behind on the daemon.
    let calls = runtime.calls();
    assert!(matches!(calls.last(), Some(Call::Start { .. })));
    assert!(!calls.iter().any(|c| matches!(c, Call::Stop { .. })));
}

#[tokio::test]
async fn test_padded_image_pulls_what_create_uses() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    orchestrator
        .start("web", Arc::new(WorkloadSpec::new(" myregistry.example/app:1 ")))
        .await?;

    let calls = runtime.calls();
    assert_eq!(
        calls[0],
        Call::Pull {
            image: "myregistry.example/app:1".to_string(),
            credential: runtime.credentials().resolve("myregistry.example/app:1").cloned(),
        }
    );
    assert!(matches!(&calls[0], Call::Pull { credential: Some(_), .. }));
    assert!(matches!(
        &calls[2],
        Call::Create { image: Some(image), .. } if image == "myregistry.example/app:1"
    ));
    Ok(())
}

#[tokio::test]
async fn test_long_name_is_left_to_the_daemon() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));
    let logical = "a".repeat(129);

    let container = orchestrator.start(&logical, web_spec()).await?;
    assert_eq!(container.name().logical(), logical);
    assert!(matches!(
        &runtime.calls()[2],
        Call::Create { name, .. } if name.starts_with(&format!("{logical}_"))
    ));
    Ok(())
}

#[tokio::test]
async fn test_name_refused_by_daemon_is_returned_unwrapped() {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()).failing(Step::Create));

    let err = orchestrator.start("bad name!", web_spec()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Daemon(_)));
    assert_eq!(err.to_string(), common::daemon_error("Create failed").to_string());
    assert!(matches!(
        &runtime.calls()[2],
        Call::Create { name, .. } if name.starts_with("bad name!_")
    ));
}

#[tokio::test]
async fn test_invalid_spec_makes_no_daemon_calls() {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    let mut spec = WorkloadSpec::new("nginx");
    spec.ports = vec!["not-a-port".to_string()];
    let err = orchestrator.start("web", Arc::new(spec)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Invalid(_)));
    assert!(runtime.calls().is_empty());

    let err = orchestrator
        .start("web", Arc::new(WorkloadSpec::new("")))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Invalid(_)));
    assert!(runtime.calls().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_stop_failure_is_swallowed() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()).failing(Step::Stop));

    let mut container = orchestrator.start("web", web_spec()).await?;
    container.stop().await;

    assert_eq!(container.phase(), LifecyclePhase::Started);
    assert!(matches!(runtime.calls().last(), Some(Call::Stop { .. })));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_stop_after_runtime_dropped() -> Result<(), Box<dyn Error>> {
    let (runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    let mut container = orchestrator.start("web", web_spec()).await?;
    drop(orchestrator);
    drop(runtime);

    container.stop().await;
    assert_eq!(container.phase(), LifecyclePhase::Started);
    Ok(())
}

#[tokio::test]
async fn test_mark_stable_keeps_first_timestamp() -> Result<(), Box<dyn Error>> {
    let (_runtime, orchestrator) = setup(FakeRuntime::new(resolver()));

    let mut container = orchestrator.start("web", web_spec()).await?;
    let first = container.mark_stable();
    assert!(first >= container.started_at());

    let second = container.mark_stable();
    assert_eq!(first, second);
    assert_eq!(container.stable_at(), Some(first));
    Ok(())
}
