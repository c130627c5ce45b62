//! Error types for the gantry test framework

use thiserror::Error;

/// Main error type for decode, mutation, handler, and lifecycle operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed document content, attributed to its source and ordinal index
    #[error("decode error in {locator} (document {index}): {message}")]
    Decode {
        /// Source locator (file path, URL, or stream name)
        locator: String,
        /// Zero-based ordinal of the document within its stream
        index: usize,
        /// Parser or deserializer message
        message: String,
    },

    /// I/O error while reading a source
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error while fetching a URL source
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error outside the per-document decode path
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A mutation option failed, aborting the document it was applied to
    #[error("mutation {option:?} failed: {message}")]
    Mutation {
        /// Name of the failing option
        option: String,
        /// Failure detail
        message: String,
    },

    /// The requested object does not exist on the control plane
    #[error("{kind} {name:?} not found")]
    NotFound {
        /// Resource kind
        kind: String,
        /// Resource name
        name: String,
    },

    /// The object already exists on the control plane
    #[error("{kind} {name:?} already exists")]
    AlreadyExists {
        /// Resource kind
        kind: String,
        /// Resource name
        name: String,
    },

    /// The caller's cancellation token fired while an operation was in flight
    #[error("operation cancelled")]
    Cancelled,

    /// Any other resource client failure
    #[error("client error: {0}")]
    Client(String),

    /// A setup routine failed; remaining setup and the test body were skipped
    #[error("setup failed: {0}")]
    Setup(#[source] Box<Error>),

    /// The test body panicked; the panic payload is preserved as text
    #[error("test body panicked: {0}")]
    Panic(String),

    /// Multiple failures surfaced together (finish-phase aggregation)
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl Error {
    /// Create a decode error attributed to a source locator and document index
    pub fn decode(locator: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            locator: locator.into(),
            index,
            message: message.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a mutation error for the named option
    pub fn mutation(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mutation {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error for the given kind and name
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an already-exists error for the given kind and name
    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a generic client error with the given message
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    /// True if this error is a not-found classification.
    ///
    /// Usable directly as a handler predicate: `Error::is_not_found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True if this error is an already-exists classification
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// True if this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A collection of failures surfaced together.
///
/// Finish routines are all attempted even when earlier ones fail, so the
/// lifecycle controller reports every failure rather than the first.
#[derive(Debug)]
pub struct AggregateError(pub Vec<Error>);

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure(s):", self.0.len())?;
        for err in &self.0 {
            write!(f, " [{err}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
