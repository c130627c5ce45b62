//! Resource object model
//!
//! Everything the decode pipeline produces implements [`ResourceObject`]:
//! a shared capability surface (name, namespace, labels, annotations, and
//! group/version/kind identity) over two representations:
//!
//! - typed objects: plain serde structs with an [`ObjectMeta`] field and a
//!   [`HasTypeMeta`] impl pinning their API version and kind at compile time
//! - [`Unstructured`]: an open mapping with no compiled-in schema, used as
//!   the fallback for kinds no schema was registered for
//!
//! Type identity is deliberately not settable through the trait: once an
//! object is resolved, its group/version/kind never changes. Mutation
//! options may only touch metadata and spec-level content.

mod api;
mod registry;
mod unstructured;

pub use api::{ConfigMap, Namespace, ServiceAccount};
pub use registry::TypeRegistry;
pub use unstructured::Unstructured;

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// =============================================================================
// Type identity
// =============================================================================

/// API version and kind of a resource, as written in a manifest
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    /// Full API version (e.g. "v1", "apps/v1")
    pub api_version: String,
    /// Resource kind (e.g. "ConfigMap")
    pub kind: String,
}

impl TypeMeta {
    /// Create a TypeMeta from an API version and kind
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Split the API version into its group/version/kind identity.
    ///
    /// Core-group versions ("v1") have an empty group.
    pub fn gvk(&self) -> GroupVersionKind {
        let (group, version) = match self.api_version.split_once('/') {
            Some((group, version)) => (group.to_string(), version.to_string()),
            None => (String::new(), self.api_version.clone()),
        };
        GroupVersionKind {
            group,
            version,
            kind: self.kind.clone(),
        }
    }
}

/// Fully-qualified schema identity of a resource
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    /// API group; empty for the core group
    pub group: String,
    /// API version within the group
    pub version: String,
    /// Resource kind
    pub kind: String,
}

impl GroupVersionKind {
    /// Create a GVK from its three parts
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Render the API version this GVK belongs to ("group/version" or "version")
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl std::fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Compile-time type identity for typed resources.
///
/// Implement this for serde structs that represent a known schema so the
/// [`TypeRegistry`] can match manifests to them by group/version/kind.
pub trait HasTypeMeta {
    /// Full API version (e.g. "v1", "apps/v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g. "ConfigMap")
    const KIND: &'static str;

    /// Build the TypeMeta from the type's constants
    fn type_meta() -> TypeMeta {
        TypeMeta::new(Self::API_VERSION, Self::KIND)
    }

    /// Build the GVK from the type's constants
    fn gvk() -> GroupVersionKind {
        Self::type_meta().gvk()
    }
}

// =============================================================================
// ObjectMeta
// =============================================================================

/// Standard resource metadata shared by every object representation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    #[serde(default)]
    pub name: String,
    /// Resource namespace, if namespaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create metadata with the given name and no namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// ResourceObject trait
// =============================================================================

/// Common capability surface over typed and unstructured resources.
///
/// The decode pipeline hands every resolved object to mutation options and
/// handlers through this trait, so callers work uniformly whether a schema
/// was registered for the kind or not. Note there is no identity setter:
/// group/version/kind is fixed at resolution time.
pub trait ResourceObject: std::fmt::Debug + Send + Sync {
    /// API version and kind of this object
    fn type_meta(&self) -> TypeMeta;

    /// Snapshot of the object's metadata
    fn metadata(&self) -> ObjectMeta;

    /// Replace the object's metadata
    fn set_metadata(&mut self, metadata: ObjectMeta);

    /// Render the full manifest (including type identity) as a JSON value
    fn to_value(&self) -> Result<Value, Error>;

    /// Downcast support for handlers and tests
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Group/version/kind identity
    fn gvk(&self) -> GroupVersionKind {
        self.type_meta().gvk()
    }

    /// Resource name
    fn name(&self) -> String {
        self.metadata().name
    }

    /// Set the resource name
    fn set_name(&mut self, name: &str) {
        let mut meta = self.metadata();
        meta.name = name.to_string();
        self.set_metadata(meta);
    }

    /// Resource namespace, if set
    fn namespace(&self) -> Option<String> {
        self.metadata().namespace
    }

    /// Set (or override) the resource namespace
    fn set_namespace(&mut self, namespace: &str) {
        let mut meta = self.metadata();
        meta.namespace = Some(namespace.to_string());
        self.set_metadata(meta);
    }

    /// Snapshot of the object's labels
    fn labels(&self) -> BTreeMap<String, String> {
        self.metadata().labels
    }

    /// Merge the given labels into the object, overwriting existing keys
    fn merge_labels(&mut self, labels: &BTreeMap<String, String>) {
        let mut meta = self.metadata();
        for (key, value) in labels {
            meta.labels.insert(key.clone(), value.clone());
        }
        self.set_metadata(meta);
    }

    /// Snapshot of the object's annotations
    fn annotations(&self) -> BTreeMap<String, String> {
        self.metadata().annotations
    }

    /// Merge the given annotations into the object, overwriting existing keys
    fn merge_annotations(&mut self, annotations: &BTreeMap<String, String>) {
        let mut meta = self.metadata();
        for (key, value) in annotations {
            meta.annotations.insert(key.clone(), value.clone());
        }
        self.set_metadata(meta);
    }
}

/// Serialize a typed resource to a full manifest value, injecting its
/// compile-time type identity.
pub(crate) fn typed_to_value<T>(obj: &T) -> Result<Value, Error>
where
    T: Serialize + HasTypeMeta,
{
    let mut value = serde_json::to_value(obj).map_err(|e| Error::serialization(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "apiVersion".to_string(),
            Value::String(T::API_VERSION.to_string()),
        );
        map.insert("kind".to_string(), Value::String(T::KIND.to_string()));
    }
    Ok(value)
}
