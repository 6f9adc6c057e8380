use meshwire::prelude::*;
use meshwire::{GraphSnapshot, SilentObserver};
use std::sync::atomic::{AtomicUsize, Ordering};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

struct Repository {
    dsn: String,
}

struct Service {
    repository: Arc<Repository>,
}

trait Logger: Send + Sync {
    fn tag(&self) -> &'static str;
}

struct StdoutLogger;

impl Logger for StdoutLogger {
    fn tag(&self) -> &'static str {
        "stdout"
    }
}

struct SyslogLogger;

impl Logger for SyslogLogger {
    fn tag(&self) -> &'static str {
        "syslog"
    }
}

struct Consumer {
    logger: Arc<dyn Logger>,
}

#[test]
fn test_repository_shared_by_service() {
    init_tracing();
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);

    let container = Container::new([
        provide(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Repository {
                dsn: "sqlite::memory:".to_string(),
            }
        })
        .into(),
        provide(|repository: Arc<Repository>| Service { repository }).into(),
    ])
    .unwrap();

    let mut service: Option<Arc<Service>> = None;
    container.populate(&mut service).unwrap();
    let service = service.unwrap();
    let repository = container.resolve::<Repository>().unwrap();

    assert!(Arc::ptr_eq(&service.repository, &repository));
    assert_eq!(repository.dsn, "sqlite::memory:");
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_first_logger_wins() {
    init_tracing();
    let container = Container::builder()
        .capability(capability!(dyn Logger => StdoutLogger, SyslogLogger))
        .provide(provide(|| StdoutLogger).as_::<dyn Logger>())
        .provide(provide(|| SyslogLogger).as_::<dyn Logger>())
        .provide(provide(|logger: Arc<dyn Logger>| Consumer { logger }))
        .build()
        .unwrap();

    for _ in 0..5 {
        let consumer = container.resolve::<Consumer>().unwrap();
        assert_eq!(consumer.logger.tag(), "stdout");
    }

    // Registration order decides, regardless of declaration order in the descriptor.
    let reversed = Container::builder()
        .capability(capability!(dyn Logger => StdoutLogger, SyslogLogger))
        .provide(provide(|| SyslogLogger).as_::<dyn Logger>())
        .provide(provide(|| StdoutLogger).as_::<dyn Logger>())
        .provide(provide(|logger: Arc<dyn Logger>| Consumer { logger }))
        .build()
        .unwrap();
    assert_eq!(reversed.resolve::<Consumer>().unwrap().logger.tag(), "syslog");
}

#[test]
fn test_missing_dependency_fails_build() {
    struct X;
    struct Y;

    let result = Container::builder()
        .observer(SilentObserver)
        .provide(provide(|_: Arc<Y>| X))
        .build();

    let error = result.unwrap_err();
    let message = error.to_string();
    assert!(matches!(error, MeshwireError::UnsatisfiedDependency { .. }));
    assert!(message.contains("X"), "{message}");
    assert!(message.contains("Y"), "{message}");
}

#[test]
fn test_ambiguity_policy_from_config() {
    let service = meshwire::ConfigService::default();
    service.set(ContainerConfig::AMBIGUITY_VAR, "reject");
    let config = ContainerConfig::load(&service).unwrap();

    let result = Container::builder()
        .config(config)
        .capability(capability!(dyn Logger => StdoutLogger, SyslogLogger))
        .provide(provide(|| StdoutLogger).as_::<dyn Logger>())
        .provide(provide(|| SyslogLogger).as_::<dyn Logger>())
        .provide(provide(|logger: Arc<dyn Logger>| Consumer { logger }))
        .build();

    match result {
        Err(MeshwireError::AmbiguousCapability { candidates, .. }) => {
            assert!(candidates[0].ends_with("StdoutLogger"));
            assert!(candidates[1].ends_with("SyslogLogger"));
        }
        other => panic!("expected AmbiguousCapability, got {:?}", other.err()),
    }
}

#[test]
fn test_snapshot_round_trip() {
    let container = Container::builder()
        .provide(blueprint(Repository {
            dsn: "postgres://primary".to_string(),
        }))
        .provide(provide(|repository: Arc<Repository>| Service { repository }))
        .build()
        .unwrap();

    let before: GraphSnapshot = container.snapshot();
    assert!(before.nodes.iter().all(|node| !node.built));

    container.resolve::<Service>().unwrap();
    let json = container.snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(
        value["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .all(|node| node["built"] == true)
    );
}
