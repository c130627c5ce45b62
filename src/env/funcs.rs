//! Reusable lifecycle routines
//!
//! Pre-built setup/finish routines over a [`ResourceClient`]. Cluster
//! provisioning itself is a collaborator concern; these helpers cover the
//! namespace fixtures most suites need.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::ResourceClient;
use crate::env::EnvConfig;
use crate::error::Error;
use crate::object::Namespace;

/// Setup routine that creates the named namespace and records it in the
/// configuration for the test body and later routines
pub fn create_namespace(
    client: Arc<dyn ResourceClient>,
    name: impl Into<String>,
) -> impl FnOnce(CancellationToken, EnvConfig) -> BoxFuture<'static, Result<EnvConfig, Error>>
       + Send
       + 'static {
    let name = name.into();
    move |ctx, mut config| {
        async move {
            info!(namespace = %name, "creating test namespace");
            let ns = Namespace::named(&name);
            client.create(ctx, &ns).await?;
            config.set_namespace(&name);
            Ok(config)
        }
        .boxed()
    }
}

/// Finish routine that deletes the named namespace and clears it from the
/// configuration if it was the active one
pub fn delete_namespace(
    client: Arc<dyn ResourceClient>,
    name: impl Into<String>,
) -> impl FnOnce(CancellationToken, EnvConfig) -> BoxFuture<'static, Result<EnvConfig, Error>>
       + Send
       + 'static {
    let name = name.into();
    move |ctx, mut config| {
        async move {
            info!(namespace = %name, "deleting test namespace");
            let ns = Namespace::named(&name);
            client.delete(ctx, &ns).await?;
            if config.namespace() == Some(name.as_str()) {
                config.clear_namespace();
            }
            Ok(config)
        }
        .boxed()
    }
}
