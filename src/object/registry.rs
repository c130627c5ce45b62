//! Schema registry mapping group/version/kind to typed decoders
//!
//! Resolution is pure and never fails on an unknown kind: anything without
//! a registered schema falls back to [`Unstructured`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::Error;
use crate::object::{
    ConfigMap, GroupVersionKind, HasTypeMeta, Namespace, ResourceObject, ServiceAccount, TypeMeta,
    Unstructured,
};

type DecodeFn = Box<dyn Fn(Value) -> Result<Box<dyn ResourceObject>, Error> + Send + Sync>;

/// Registry of known schemas, consulted once per decoded document
#[derive(Default)]
pub struct TypeRegistry {
    decoders: HashMap<GroupVersionKind, DecodeFn>,
}

impl TypeRegistry {
    /// Create an empty registry; every document resolves to [`Unstructured`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with the built-in core types
    /// ([`ConfigMap`], [`Namespace`], [`ServiceAccount`])
    pub fn with_core_types() -> Self {
        let mut registry = Self::new();
        registry.register::<ConfigMap>();
        registry.register::<Namespace>();
        registry.register::<ServiceAccount>();
        registry
    }

    /// Register a typed schema.
    ///
    /// Manifests whose `apiVersion`/`kind` match `T`'s identity will decode
    /// into `T`. Unknown fields in the manifest are kept legal so evolving
    /// schemas keep decoding.
    pub fn register<T>(&mut self)
    where
        T: HasTypeMeta + ResourceObject + DeserializeOwned + 'static,
    {
        self.decoders.insert(
            <T as HasTypeMeta>::gvk(),
            Box::new(|value| {
                let obj: T = serde_json::from_value(value)
                    .map_err(|e| Error::serialization(e.to_string()))?;
                Ok(Box::new(obj) as Box<dyn ResourceObject>)
            }),
        );
    }

    /// True if a schema is registered for the given identity
    pub fn contains(&self, gvk: &GroupVersionKind) -> bool {
        self.decoders.contains_key(gvk)
    }

    /// Resolve a decoded document into an object.
    ///
    /// On a registered identity (and no force flag) the typed decoder runs;
    /// otherwise the raw mapping is wrapped in [`Unstructured`]. The only
    /// failure modes are a non-mapping document and a typed decoder
    /// rejecting malformed content; an unknown kind is never an error.
    pub fn resolve(
        &self,
        value: Value,
        force_unstructured: bool,
    ) -> Result<Box<dyn ResourceObject>, Error> {
        if !value.is_object() {
            return Err(Error::serialization("document is not a mapping"));
        }
        if !force_unstructured {
            let type_meta = TypeMeta::new(
                value["apiVersion"].as_str().unwrap_or_default(),
                value["kind"].as_str().unwrap_or_default(),
            );
            let gvk = type_meta.gvk();
            if let Some(decode) = self.decoders.get(&gvk) {
                trace!(%gvk, "resolving document to registered type");
                return decode(value);
            }
            trace!(%gvk, "no schema registered, falling back to unstructured");
        }
        Ok(Box::new(Unstructured::new(value)))
    }
}
