//! gantry: end-to-end test framework for cluster-style control planes
//!
//! gantry orchestrates e2e tests against a live control plane with two
//! cooperating facilities:
//!
//! - a manifest decoding pipeline that turns byte streams (files, directory
//!   subtrees, URLs, in-memory readers) into typed or schema-agnostic
//!   resource objects, applies an ordered chain of mutations to each, and
//!   dispatches each to a caller-supplied handler
//! - an environment lifecycle controller that sequences setup and finish
//!   routines around a test run with guaranteed-cleanup semantics even
//!   under partial failure
//!
//! The client that actually talks to a control plane is a capability gantry
//! consumes, not something it implements: see [`client::ResourceClient`].
//!
//! # Modules
//!
//! - [`decoder`] - multi-document decoding, mutation options, handler
//!   dispatch and composition
//! - [`object`] - the resource object model (typed and unstructured)
//! - [`client`] - the consumed resource-client capability
//! - [`env`] - environment lifecycle controller and configuration
//! - [`conf`] - kubeconfig fixture support
//! - [`error`] - error types and classification predicates

#![deny(missing_docs)]

pub mod client;
pub mod conf;
pub mod decoder;
pub mod env;
pub mod error;
pub mod object;

pub use error::Error;

/// Result type alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;
