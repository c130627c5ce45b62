//! Test environment configuration
//!
//! [`EnvConfig`] is owned by one [`Environment`](crate::env::Environment)
//! for the duration of a run and threaded through lifecycle routines by
//! value: each routine returns the (possibly augmented) config the next
//! routine sees. There is no process-wide mutable state.

use std::path::{Path, PathBuf};

use rand::Rng;

/// Connection and fixture identity carried through a test run
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    kubeconfig: Option<PathBuf>,
    kube_context: Option<String>,
    namespace: Option<String>,
    cluster_name: Option<String>,
}

impl EnvConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kubeconfig path (builder style)
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Set the kubeconfig context name (builder style)
    pub fn with_kube_context(mut self, context: impl Into<String>) -> Self {
        self.kube_context = Some(context.into());
        self
    }

    /// Set the active test namespace (builder style)
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the cluster name (builder style)
    pub fn with_cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = Some(name.into());
        self
    }

    /// Kubeconfig path, if set
    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    /// Kubeconfig context name, if set
    pub fn kube_context(&self) -> Option<&str> {
        self.kube_context.as_deref()
    }

    /// Active test namespace, if one was created or assigned
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Cluster name, if one was created or assigned
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster_name.as_deref()
    }

    /// Record the active test namespace
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = Some(namespace.into());
    }

    /// Forget the active test namespace (after cleanup)
    pub fn clear_namespace(&mut self) {
        self.namespace = None;
    }

    /// Record the kubeconfig path
    pub fn set_kubeconfig(&mut self, path: impl Into<PathBuf>) {
        self.kubeconfig = Some(path.into());
    }

    /// Record the cluster name
    pub fn set_cluster_name(&mut self, name: impl Into<String>) {
        self.cluster_name = Some(name.into());
    }

    /// Forget the cluster name (after teardown)
    pub fn clear_cluster_name(&mut self) {
        self.cluster_name = None;
    }
}

/// Generate a fixture name: `prefix` plus a random lowercase alphanumeric
/// suffix, truncated to `max_len` characters.
///
/// Names are ASCII, so truncation is safe at any length.
pub fn random_name(prefix: &str, max_len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..10)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    let mut name = format!("{prefix}-{suffix}");
    name.truncate(max_len);
    name
}
