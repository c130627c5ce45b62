//! Handler dispatch and composition
//!
//! A [`Handler`] consumes one resolved object. Handlers compose: the
//! create/read/delete adapters wrap a [`ResourceClient`] capability, and
//! [`ignore_error_handler`] decorates any handler with predicate-based
//! error suppression (e.g. deleting an already-absent object is success).

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{ObjectKey, ResourceClient};
use crate::error::Error;
use crate::object::ResourceObject;

/// Consumer invoked once per successfully decoded and mutated object
#[async_trait]
pub trait Handler: Send + Sync {
    /// Process one object; a returned error stops the stream it came from
    async fn handle(
        &self,
        ctx: CancellationToken,
        obj: Box<dyn ResourceObject>,
    ) -> Result<(), Error>;
}

/// Adapter turning an async closure into a [`Handler`]
pub struct FnHandler<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F, Fut>
where
    F: Fn(CancellationToken, Box<dyn ResourceObject>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(CancellationToken, Box<dyn ResourceObject>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    async fn handle(
        &self,
        ctx: CancellationToken,
        obj: Box<dyn ResourceObject>,
    ) -> Result<(), Error> {
        (self.f)(ctx, obj).await
    }
}

// =============================================================================
// Resource client adapters
// =============================================================================

struct CreateHandler {
    client: Arc<dyn ResourceClient>,
}

#[async_trait]
impl Handler for CreateHandler {
    async fn handle(
        &self,
        ctx: CancellationToken,
        obj: Box<dyn ResourceObject>,
    ) -> Result<(), Error> {
        debug!(key = %ObjectKey::from_object(obj.as_ref()), "creating object");
        self.client.create(ctx, obj.as_ref()).await
    }
}

/// Handler that creates each decoded object on the control plane
pub fn create_handler(client: Arc<dyn ResourceClient>) -> impl Handler {
    CreateHandler { client }
}

struct DeleteHandler {
    client: Arc<dyn ResourceClient>,
}

#[async_trait]
impl Handler for DeleteHandler {
    async fn handle(
        &self,
        ctx: CancellationToken,
        obj: Box<dyn ResourceObject>,
    ) -> Result<(), Error> {
        debug!(key = %ObjectKey::from_object(obj.as_ref()), "deleting object");
        self.client.delete(ctx, obj.as_ref()).await
    }
}

/// Handler that deletes each decoded object from the control plane
pub fn delete_handler(client: Arc<dyn ResourceClient>) -> impl Handler {
    DeleteHandler { client }
}

struct ReadHandler<H> {
    client: Arc<dyn ResourceClient>,
    inner: H,
}

#[async_trait]
impl<H> Handler for ReadHandler<H>
where
    H: Handler,
{
    async fn handle(
        &self,
        ctx: CancellationToken,
        obj: Box<dyn ResourceObject>,
    ) -> Result<(), Error> {
        let key = ObjectKey::from_object(obj.as_ref());
        debug!(%key, "reading object");
        let fetched = self.client.get(ctx.clone(), key).await?;
        self.inner.handle(ctx, fetched).await
    }
}

/// Handler that fetches the live state of each decoded object and hands the
/// fetched object to `inner`
pub fn read_handler<H>(client: Arc<dyn ResourceClient>, inner: H) -> impl Handler
where
    H: Handler,
{
    ReadHandler { client, inner }
}

// =============================================================================
// Error-filtering decorator
// =============================================================================

struct IgnoreErrorHandler<H, P> {
    inner: H,
    predicate: P,
}

#[async_trait]
impl<H, P> Handler for IgnoreErrorHandler<H, P>
where
    H: Handler,
    P: Fn(&Error) -> bool + Send + Sync,
{
    async fn handle(
        &self,
        ctx: CancellationToken,
        obj: Box<dyn ResourceObject>,
    ) -> Result<(), Error> {
        match self.inner.handle(ctx, obj).await {
            Err(err) if (self.predicate)(&err) => {
                debug!(error = %err, "ignoring handler error matching predicate");
                Ok(())
            }
            other => other,
        }
    }
}

/// Decorate `inner` so that errors matching `predicate` count as success.
///
/// Non-matching errors pass through unchanged. The classification
/// predicates on [`Error`] (`Error::is_not_found`, ...) slot in directly.
pub fn ignore_error_handler<H, P>(inner: H, predicate: P) -> impl Handler
where
    H: Handler,
    P: Fn(&Error) -> bool + Send + Sync,
{
    IgnoreErrorHandler { inner, predicate }
}

/// Delete each decoded object, treating not-found as success.
///
/// The canonical composition for idempotent cleanup.
pub fn delete_ignore_not_found(client: Arc<dyn ResourceClient>) -> impl Handler {
    ignore_error_handler(delete_handler(client), Error::is_not_found)
}
