//! Handler adapters and error-filtering composition against the fake
//! resource client

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use gantry::client::{ObjectKey, ResourceClient};
use gantry::decoder::{
    create_handler, decode_each_file, delete_handler, delete_ignore_not_found, handler_fn,
    ignore_error_handler, mutate_labels, mutate_namespace, read_handler, Handler,
};
use gantry::object::{ConfigMap, GroupVersionKind, ObjectMeta, ServiceAccount, TypeRegistry};
use gantry::Error;

use super::helpers::{DenyingClient, FakeClient};

fn service_account(name: &str, namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta::new(name).with_namespace(namespace),
        automount_service_account_token: None,
    }
}

#[tokio::test]
async fn create_handler_materializes_decoded_manifests() {
    let client = Arc::new(FakeClient::new());
    let ctx = CancellationToken::new();
    let registry = TypeRegistry::with_core_types();
    let handler = create_handler(client.clone());

    decode_each_file(
        &ctx,
        super::helpers::fixtures_dir(),
        "sa-*",
        &registry,
        &handler,
        vec![
            mutate_namespace("handler-ns"),
            mutate_labels(BTreeMap::from([("suite".to_string(), "handlers".to_string())])),
        ],
    )
    .await
    .unwrap();

    assert_eq!(client.len(), 3);
    // mutations ran before dispatch, so objects live in the injected namespace
    assert!(client.contains(&ObjectKey {
        gvk: GroupVersionKind::new("", "v1", "ServiceAccount"),
        namespace: Some("handler-ns".to_string()),
        name: "sa-alpha".to_string(),
    }));
}

#[tokio::test]
async fn creating_the_same_object_twice_is_already_exists() {
    let client = Arc::new(FakeClient::new());
    let ctx = CancellationToken::new();
    let handler = create_handler(client.clone());

    let sa = service_account("runner", "ci");
    handler.handle(ctx.clone(), Box::new(sa.clone())).await.unwrap();
    let err = handler.handle(ctx, Box::new(sa)).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn read_handler_hands_the_live_object_to_its_inner_handler() {
    let client = Arc::new(FakeClient::new());
    let ctx = CancellationToken::new();

    let stored = ConfigMap {
        metadata: ObjectMeta::new("settings").with_namespace("ci"),
        data: BTreeMap::from([("mode".to_string(), "live".to_string())]),
    };
    client.create(ctx.clone(), &stored).await.unwrap();

    // the decoded manifest only carries identity; data comes from the store
    let manifest = ConfigMap {
        metadata: ObjectMeta::new("settings").with_namespace("ci"),
        data: BTreeMap::new(),
    };
    let inner = handler_fn(|_ctx, obj| async move {
        let cfg = obj
            .as_any()
            .downcast_ref::<ConfigMap>()
            .ok_or_else(|| Error::client("expected a ConfigMap"))?;
        assert_eq!(cfg.data["mode"], "live");
        Ok(())
    });
    read_handler(client.clone(), inner)
        .handle(ctx, Box::new(manifest))
        .await
        .unwrap();
}

#[tokio::test]
async fn reading_an_absent_object_is_not_found() {
    let client = Arc::new(FakeClient::new());
    let ctx = CancellationToken::new();
    let inner = handler_fn(|_ctx, _obj| async { Ok::<(), Error>(()) });
    let err = read_handler(client, inner)
        .handle(ctx, Box::new(service_account("ghost", "ci")))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_is_exact_but_the_filtered_variant_is_idempotent() {
    let client = Arc::new(FakeClient::new());
    let ctx = CancellationToken::new();
    let sa = service_account("runner", "ci");
    client.create(ctx.clone(), &sa).await.unwrap();

    let delete = delete_handler(client.clone());
    delete.handle(ctx.clone(), Box::new(sa.clone())).await.unwrap();
    let err = delete
        .handle(ctx.clone(), Box::new(sa.clone()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let idempotent = delete_ignore_not_found(client.clone());
    idempotent.handle(ctx, Box::new(sa)).await.unwrap();
    assert_eq!(client.len(), 0);
}

#[tokio::test]
async fn error_filter_passes_unmatched_errors_through() {
    let client = Arc::new(DenyingClient);
    let ctx = CancellationToken::new();
    let handler = delete_ignore_not_found(client);
    let err = handler
        .handle(ctx, Box::new(service_account("runner", "ci")))
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("permission denied"));
}

#[tokio::test]
async fn error_filter_accepts_custom_predicates() {
    let inner = handler_fn(|_ctx, _obj| async { Err(Error::client("transient glitch")) });
    let handler = ignore_error_handler(inner, |err: &Error| {
        err.to_string().contains("transient")
    });
    let ctx = CancellationToken::new();
    handler
        .handle(ctx, Box::new(service_account("runner", "ci")))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_token_aborts_client_dispatch() {
    let client = Arc::new(FakeClient::new());
    let ctx = CancellationToken::new();
    ctx.cancel();
    let err = create_handler(client.clone())
        .handle(ctx, Box::new(service_account("runner", "ci")))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(client.len(), 0);
}
