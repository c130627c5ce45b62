//! Setup/finish sequencing, guaranteed cleanup, and failure aggregation

use std::sync::{Arc, Mutex};

use gantry::env::{funcs, random_name, EnvConfig, Environment, Phase};
use gantry::error::{AggregateError, Error};

use super::helpers::FakeClient;

type EventLog = Arc<Mutex<Vec<&'static str>>>;

fn record(events: &EventLog, event: &'static str) {
    events.lock().unwrap().push(event);
}

#[tokio::test]
async fn happy_path_runs_every_phase_in_order() {
    super::helpers::init_tracing();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));

    let (a, b, x, y, body_log) = (
        events.clone(),
        events.clone(),
        events.clone(),
        events.clone(),
        events.clone(),
    );
    let report = Environment::new()
        .setup(move |_ctx, mut config| async move {
            record(&a, "setup-a");
            config.set_namespace("lifecycle-ns");
            Ok(config)
        })
        .setup(move |_ctx, config| async move {
            record(&b, "setup-b");
            // the second routine sees what the first one recorded
            assert_eq!(config.namespace(), Some("lifecycle-ns"));
            Ok(config)
        })
        .finish(move |_ctx, config| async move {
            record(&x, "finish-x");
            assert_eq!(config.namespace(), Some("lifecycle-ns"));
            Ok(config)
        })
        .finish(move |_ctx, config| async move {
            record(&y, "finish-y");
            Ok(config)
        })
        .run(move |config| async move {
            record(&body_log, "body");
            assert_eq!(config.namespace(), Some("lifecycle-ns"));
            Ok(())
        })
        .await;

    assert!(report.is_success());
    assert_eq!(report.phase, Phase::Done);
    assert!(report.failed_phase.is_none());
    assert_eq!(
        *events.lock().unwrap(),
        ["setup-a", "setup-b", "body", "finish-x", "finish-y"]
    );
    report.into_result().unwrap();
}

#[tokio::test]
async fn setup_failure_skips_the_body_but_never_cleanup() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));

    let (a, b, x, y, body_log) = (
        events.clone(),
        events.clone(),
        events.clone(),
        events.clone(),
        events.clone(),
    );
    let report = Environment::new()
        .setup(move |_ctx, config| async move {
            record(&a, "setup-a");
            Ok(config)
        })
        .setup(move |_ctx, _config| async move {
            record(&b, "setup-b");
            Err(Error::client("cluster unreachable"))
        })
        .setup(|_ctx, _config| async move {
            panic!("a routine after a failed one must never run");
        })
        .finish(move |_ctx, config| async move {
            record(&x, "finish-x");
            Ok(config)
        })
        .finish(move |_ctx, config| async move {
            record(&y, "finish-y");
            Ok(config)
        })
        .run(move |_config| async move {
            record(&body_log, "body");
            Ok(())
        })
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed_phase, Some(Phase::SettingUp));
    assert!(report.setup_error.is_some());
    assert!(report.body_error.is_none());
    assert_eq!(
        *events.lock().unwrap(),
        ["setup-a", "setup-b", "finish-x", "finish-y"]
    );

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, Error::Setup(_)));
    assert!(err.to_string().contains("cluster unreachable"));
}

#[tokio::test]
async fn body_panic_is_captured_and_cleanup_still_runs() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let x = events.clone();

    let report = Environment::new()
        .finish(move |_ctx, config| async move {
            record(&x, "finish-x");
            Ok(config)
        })
        .run(|_config| async { panic!("deliberate test panic") })
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed_phase, Some(Phase::Running));
    match &report.body_error {
        Some(Error::Panic(message)) => assert!(message.contains("deliberate test panic")),
        other => panic!("expected a captured panic, got {other:?}"),
    }
    assert_eq!(*events.lock().unwrap(), ["finish-x"]);
}

#[tokio::test]
async fn finish_failures_are_collected_not_short_circuited() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let (x, z) = (events.clone(), events.clone());

    let report = Environment::new()
        .finish(move |_ctx, _config| async move {
            record(&x, "finish-x");
            Err(Error::client("volume still attached"))
        })
        .finish(move |_ctx, _config| async move {
            Err(Error::client("namespace stuck terminating"))
        })
        .finish(move |_ctx, config| async move {
            record(&z, "finish-z");
            Ok(config)
        })
        .run(|_config| async { Ok(()) })
        .await;

    assert_eq!(report.failed_phase, Some(Phase::FinishingUp));
    assert_eq!(report.finish_errors.len(), 2);
    assert_eq!(*events.lock().unwrap(), ["finish-x", "finish-z"]);

    let err = report.into_result().unwrap_err();
    match err {
        Error::Aggregate(AggregateError(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected an aggregate, got {other}"),
    }
}

#[tokio::test]
async fn single_finish_failure_folds_to_itself() {
    let report = Environment::new()
        .finish(|_ctx, _config| async { Err(Error::client("leaked fixture")) })
        .run(|_config| async { Ok(()) })
        .await;
    let err = report.into_result().unwrap_err();
    assert!(err.to_string().contains("leaked fixture"));
    assert!(!matches!(err, Error::Aggregate(_)));
}

#[tokio::test]
async fn failed_routine_falls_back_to_the_last_good_config() {
    let report = Environment::new()
        .setup(|_ctx, mut config| async move {
            config.set_cluster_name("kind-e2e");
            Ok(config)
        })
        .finish(|_ctx, mut config| async move {
            // mutates, then fails: the mutation must not leak forward
            config.set_namespace("half-applied");
            Err(Error::client("cleanup api error"))
        })
        .finish(|_ctx, config| async move {
            assert_eq!(config.cluster_name(), Some("kind-e2e"));
            assert!(config.namespace().is_none());
            Ok(config)
        })
        .run(|_config| async { Ok(()) })
        .await;
    assert_eq!(report.finish_errors.len(), 1);
}

#[tokio::test]
async fn cancelled_environment_never_enters_setup_routines() {
    let env = Environment::new().setup(|_ctx, _config| async move {
        panic!("setup must not run after cancellation");
    });
    env.cancellation_token().cancel();
    let report = env
        .run(|_config| async {
            panic!("body must not run after cancellation");
        })
        .await;
    assert!(report.setup_error.as_ref().is_some_and(Error::is_cancelled));
    assert_eq!(report.failed_phase, Some(Phase::SettingUp));
    assert_eq!(report.phase, Phase::Done);
}

#[tokio::test]
async fn namespace_funcs_create_and_tear_down_the_fixture() {
    let client = Arc::new(FakeClient::new());
    let name = random_name("lifecycle", 20);

    let (setup_client, finish_client) = (client.clone(), client.clone());
    let (body_client, body_name) = (client.clone(), name.clone());
    let report = Environment::new()
        .setup(funcs::create_namespace(setup_client, name.clone()))
        .finish(funcs::delete_namespace(finish_client, name.clone()))
        .run(move |config| async move {
            assert_eq!(config.namespace(), Some(body_name.as_str()));
            assert_eq!(body_client.len(), 1);
            Ok(())
        })
        .await;

    assert!(report.is_success());
    assert_eq!(client.len(), 0);
}

#[tokio::test]
async fn kubeconfig_fixture_threads_through_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = gantry::conf::write_kubeconfig(dir.path(), &["test-context"])
        .await
        .unwrap();
    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(contents.contains("current-context: test-context"));

    let config = EnvConfig::new()
        .with_kubeconfig(&path)
        .with_kube_context("test-context");
    let report = Environment::with_config(config)
        .run(move |config| async move {
            assert_eq!(config.kubeconfig(), Some(path.as_path()));
            assert_eq!(config.kube_context(), Some("test-context"));
            Ok(())
        })
        .await;
    assert!(report.is_success());
}
