//! Kubeconfig fixture support
//!
//! Test suites often need a kubeconfig on disk before any collaborator can
//! connect. This module resolves the conventional locations and generates
//! deterministic multi-context kubeconfig documents for fixtures. Credential
//! handling is out of scope; generated configs name users but carry no
//! secrets.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;

/// Resolve the kubeconfig path the way command-line tooling does:
/// `$KUBECONFIG` when set and non-empty, otherwise `~/.kube/config` if it
/// exists.
pub fn resolve_kubeconfig() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBECONFIG") {
        if !path.is_empty() {
            debug!(%path, "using kubeconfig from KUBECONFIG");
            return Some(PathBuf::from(path));
        }
    }
    let default = dirs::home_dir()?.join(".kube").join("config");
    default.exists().then_some(default)
}

/// Generate a kubeconfig document with one cluster, context, and user
/// stanza per name. `current-context` points at the first name.
pub fn gen_kubeconfig(contexts: &[&str]) -> String {
    let mut out = String::from("---\napiVersion: v1\nkind: Config\nclusters:\n");
    for ctx in contexts {
        out.push_str(&format!("- cluster:\n    server: {ctx}\n  name: {ctx}\n"));
    }
    out.push_str("contexts:\n");
    for ctx in contexts {
        out.push_str(&format!(
            "- context:\n    cluster: {ctx}\n    user: {ctx}\n  name: {ctx}\n"
        ));
    }
    out.push_str("users:\n");
    for ctx in contexts {
        out.push_str(&format!("- name: {ctx}\n"));
    }
    out.push_str("preferences: {}\n");
    if let Some(first) = contexts.first() {
        out.push_str(&format!("current-context: {first}\n"));
    }
    out
}

/// Write a generated kubeconfig named `config` under `dir`, creating the
/// directory as needed, and return its path
pub async fn write_kubeconfig(dir: &Path, contexts: &[&str]) -> Result<PathBuf, Error> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join("config");
    tokio::fs::write(&path, gen_kubeconfig(contexts)).await?;
    debug!(path = %path.display(), "wrote kubeconfig fixture");
    Ok(path)
}
