//! Built-in typed resources
//!
//! A small set of core-group schemas used by the framework's own tests and
//! lifecycle helpers. Consumers register their own types for anything else;
//! see [`TypeRegistry::register`](crate::object::TypeRegistry::register).

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::object::{typed_to_value, HasTypeMeta, ObjectMeta, ResourceObject, TypeMeta};

/// Core-group ConfigMap: string key/value configuration data
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// Standard metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Configuration data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl HasTypeMeta for ConfigMap {
    const API_VERSION: &'static str = "v1";
    const KIND: &'static str = "ConfigMap";
}

impl ResourceObject for ConfigMap {
    fn type_meta(&self) -> TypeMeta {
        <Self as HasTypeMeta>::type_meta()
    }

    fn metadata(&self) -> ObjectMeta {
        self.metadata.clone()
    }

    fn set_metadata(&mut self, metadata: ObjectMeta) {
        self.metadata = metadata;
    }

    fn to_value(&self) -> Result<Value, Error> {
        typed_to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Core-group Namespace
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Standard metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
}

impl Namespace {
    /// Create a namespace object with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
        }
    }
}

impl HasTypeMeta for Namespace {
    const API_VERSION: &'static str = "v1";
    const KIND: &'static str = "Namespace";
}

impl ResourceObject for Namespace {
    fn type_meta(&self) -> TypeMeta {
        <Self as HasTypeMeta>::type_meta()
    }

    fn metadata(&self) -> ObjectMeta {
        self.metadata.clone()
    }

    fn set_metadata(&mut self, metadata: ObjectMeta) {
        self.metadata = metadata;
    }

    fn to_value(&self) -> Result<Value, Error> {
        typed_to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Core-group ServiceAccount
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// Standard metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Whether pods running as this account auto-mount its API token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automount_service_account_token: Option<bool>,
}

impl HasTypeMeta for ServiceAccount {
    const API_VERSION: &'static str = "v1";
    const KIND: &'static str = "ServiceAccount";
}

impl ResourceObject for ServiceAccount {
    fn type_meta(&self) -> TypeMeta {
        <Self as HasTypeMeta>::type_meta()
    }

    fn metadata(&self) -> ObjectMeta {
        self.metadata.clone()
    }

    fn set_metadata(&mut self, metadata: ObjectMeta) {
        self.metadata = metadata;
    }

    fn to_value(&self) -> Result<Value, Error> {
        typed_to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
