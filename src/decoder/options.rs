//! Decode options: the ordered mutation pipeline plus decode-mode flags
//!
//! Options are named, composable, and applied strictly in the order given:
//! a later option observes the effects of earlier ones. A failing mutation
//! aborts processing of that document; nothing is rolled back, the object
//! is simply discarded.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::object::ResourceObject;

type MutateFn = Box<dyn Fn(&mut dyn ResourceObject) -> Result<(), Error> + Send + Sync>;

/// A single named decode option.
///
/// Build these with the constructors in this module ([`mutate_namespace`],
/// [`mutate_labels`], [`mutate_annotations`], [`mutate_fn`],
/// [`unstructured`], [`best_effort`]) and pass them to the decode entry
/// points.
pub struct DecodeOption {
    name: &'static str,
    kind: OptionKind,
}

enum OptionKind {
    Mutate(MutateFn),
    ForceUnstructured,
    BestEffort,
}

/// Inject or override the namespace on every decoded object
pub fn mutate_namespace(namespace: impl Into<String>) -> DecodeOption {
    let namespace = namespace.into();
    DecodeOption {
        name: "set-namespace",
        kind: OptionKind::Mutate(Box::new(move |obj| {
            obj.set_namespace(&namespace);
            Ok(())
        })),
    }
}

/// Merge the given labels into every decoded object, overwriting existing keys
pub fn mutate_labels(labels: BTreeMap<String, String>) -> DecodeOption {
    DecodeOption {
        name: "merge-labels",
        kind: OptionKind::Mutate(Box::new(move |obj| {
            obj.merge_labels(&labels);
            Ok(())
        })),
    }
}

/// Merge the given annotations into every decoded object, overwriting
/// existing keys
pub fn mutate_annotations(annotations: BTreeMap<String, String>) -> DecodeOption {
    DecodeOption {
        name: "merge-annotations",
        kind: OptionKind::Mutate(Box::new(move |obj| {
            obj.merge_annotations(&annotations);
            Ok(())
        })),
    }
}

/// Apply an arbitrary transform to every decoded object.
///
/// The transform's error aborts the document it was applied to.
pub fn mutate_fn<F>(f: F) -> DecodeOption
where
    F: Fn(&mut dyn ResourceObject) -> Result<(), Error> + Send + Sync + 'static,
{
    DecodeOption {
        name: "custom",
        kind: OptionKind::Mutate(Box::new(f)),
    }
}

/// Decode schema-agnostically: skip the registry and wrap every document in
/// [`Unstructured`](crate::object::Unstructured)
pub fn unstructured() -> DecodeOption {
    DecodeOption {
        name: "unstructured",
        kind: OptionKind::ForceUnstructured,
    }
}

/// Skip malformed documents (with a warning) instead of failing the stream.
///
/// Fail-fast on the first malformed document is the default; this is the
/// explicit opt-in for best-effort streams.
pub fn best_effort() -> DecodeOption {
    DecodeOption {
        name: "best-effort",
        kind: OptionKind::BestEffort,
    }
}

/// The assembled option set for one decode call
pub(crate) struct DecodeOptions {
    mutations: Vec<(&'static str, MutateFn)>,
    pub(crate) force_unstructured: bool,
    pub(crate) best_effort: bool,
}

impl DecodeOptions {
    pub(crate) fn build(options: Vec<DecodeOption>) -> Self {
        let mut assembled = Self {
            mutations: Vec::new(),
            force_unstructured: false,
            best_effort: false,
        };
        for option in options {
            match option.kind {
                OptionKind::Mutate(f) => assembled.mutations.push((option.name, f)),
                OptionKind::ForceUnstructured => assembled.force_unstructured = true,
                OptionKind::BestEffort => assembled.best_effort = true,
            }
        }
        assembled
    }

    /// Apply every mutation in order; the first failure wins and is
    /// attributed to the failing option's name.
    pub(crate) fn apply(&self, obj: &mut dyn ResourceObject) -> Result<(), Error> {
        for (name, mutate) in &self.mutations {
            mutate(obj).map_err(|err| match err {
                already @ Error::Mutation { .. } => already,
                other => Error::mutation(*name, other.to_string()),
            })?;
        }
        Ok(())
    }
}
