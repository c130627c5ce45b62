//! Directory-subtree decoding with pattern matching and deterministic
//! ordering, plus URL-based decoding against an in-process HTTP server

use std::sync::Mutex;

use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use gantry::decoder::{
    decode_all_files, decode_each_file, decode_url, handler_fn, mutate_namespace,
};
use gantry::object::TypeRegistry;
use gantry::Error;

use super::helpers;

#[tokio::test]
async fn pattern_selects_a_subset_of_the_subtree() {
    helpers::init_tracing();
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let names = Mutex::new(Vec::new());
    let handler = handler_fn(|_ctx, obj| {
        let names = &names;
        async move {
            names.lock().unwrap().push(obj.name());
            Ok::<(), Error>(())
        }
    });
    decode_each_file(
        &ctx,
        helpers::fixtures_dir(),
        "sa-*",
        &registry,
        &handler,
        Vec::new(),
    )
    .await
    .unwrap();
    assert_eq!(
        *names.lock().unwrap(),
        ["sa-alpha", "sa-beta", "sa-gamma"]
    );
}

#[tokio::test]
async fn wildcard_pattern_decodes_every_file_in_order() {
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let objects = decode_all_files(
        &ctx,
        helpers::fixtures_dir(),
        "*",
        &registry,
        Vec::new(),
    )
    .await
    .unwrap();

    // lexicographic file order: configmap.yaml then the three sa-* files
    let names: Vec<String> = objects.iter().map(|o| o.name()).collect();
    assert_eq!(names, ["fixture-settings", "sa-alpha", "sa-beta", "sa-gamma"]);

    let service_accounts = objects
        .iter()
        .filter(|o| o.gvk().kind == "ServiceAccount")
        .count();
    assert_eq!(service_accounts, 3);
    assert_eq!(objects.len() - service_accounts, 1);
}

#[tokio::test]
async fn repeated_runs_see_the_same_sequence() {
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let first: Vec<String> = decode_all_files(&ctx, helpers::fixtures_dir(), "*", &registry, Vec::new())
        .await
        .unwrap()
        .iter()
        .map(|o| o.name())
        .collect();
    let second: Vec<String> = decode_all_files(&ctx, helpers::fixtures_dir(), "*", &registry, Vec::new())
        .await
        .unwrap()
        .iter()
        .map(|o| o.name())
        .collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn options_apply_to_every_file_in_the_set() {
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let objects = decode_all_files(
        &ctx,
        helpers::fixtures_dir(),
        "sa-*",
        &registry,
        vec![mutate_namespace("file-suite")],
    )
    .await
    .unwrap();
    assert_eq!(objects.len(), 3);
    for obj in &objects {
        assert_eq!(obj.namespace().as_deref(), Some("file-suite"));
    }
}

#[tokio::test]
async fn unmatched_pattern_yields_an_empty_set() {
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let objects = decode_all_files(
        &ctx,
        helpers::fixtures_dir(),
        "deployment-*",
        &registry,
        Vec::new(),
    )
    .await
    .unwrap();
    assert!(objects.is_empty());
}

#[tokio::test]
async fn invalid_pattern_is_rejected() {
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let err = decode_all_files(&ctx, helpers::fixtures_dir(), "[", &registry, Vec::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("pattern"));
}

#[tokio::test]
async fn manifests_decode_from_a_url() {
    let manifest = tokio::fs::read_to_string(helpers::testdata().join("multidoc.yaml"))
        .await
        .unwrap();
    let app = Router::new().route("/manifest.yaml", get(move || async move { manifest }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let names = Mutex::new(Vec::new());
    let handler = handler_fn(|_ctx, obj| {
        let names = &names;
        async move {
            names.lock().unwrap().push(obj.name());
            Ok::<(), Error>(())
        }
    });
    decode_url(
        &ctx,
        &format!("http://{addr}/manifest.yaml"),
        &registry,
        &handler,
        Vec::new(),
    )
    .await
    .unwrap();
    assert_eq!(*names.lock().unwrap(), ["multidoc-first", "multidoc-second"]);
}

#[tokio::test]
async fn missing_url_reports_the_http_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new()).await.unwrap();
    });

    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let handler = handler_fn(|_ctx, _obj| async { Ok::<(), Error>(()) });
    let err = decode_url(
        &ctx,
        &format!("http://{addr}/absent.yaml"),
        &registry,
        &handler,
        Vec::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}
