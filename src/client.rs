//! Resource client capability
//!
//! The framework consumes, but never implements, a client able to create,
//! read, and delete objects on a live control plane. Implementations wrap
//! whatever transport the target system speaks; the pipeline only cares
//! that errors classify as not-found / already-exists / cancelled / other
//! (see [`Error`]'s predicates).

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::object::{GroupVersionKind, ResourceObject};

/// Identity of one object on the control plane
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Schema identity
    pub gvk: GroupVersionKind,
    /// Namespace, if the object is namespaced
    pub namespace: Option<String>,
    /// Object name
    pub name: String,
}

impl ObjectKey {
    /// Derive the key of an in-memory object
    pub fn from_object(obj: &dyn ResourceObject) -> Self {
        Self {
            gvk: obj.gvk(),
            namespace: obj.namespace(),
            name: obj.name(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{} ({})", ns, self.name, self.gvk),
            None => write!(f, "{} ({})", self.name, self.gvk),
        }
    }
}

/// Capability for create/get/delete against a control plane.
///
/// All calls are blocking (awaited) and cancellable through the provided
/// token; timeout policy belongs to the implementation, not the caller.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Create the object remotely
    async fn create(&self, ctx: CancellationToken, obj: &dyn ResourceObject)
        -> Result<(), Error>;

    /// Fetch the object identified by `key`
    async fn get(
        &self,
        ctx: CancellationToken,
        key: ObjectKey,
    ) -> Result<Box<dyn ResourceObject>, Error>;

    /// Delete the object remotely
    async fn delete(&self, ctx: CancellationToken, obj: &dyn ResourceObject)
        -> Result<(), Error>;
}
