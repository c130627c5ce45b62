//! Manifest decoding pipeline
//!
//! Turns byte streams (in-memory readers, files, directory subtrees, URLs)
//! into resolved resource objects, applies an ordered chain of mutation
//! options to each, and dispatches each to a [`Handler`].
//!
//! Per document the pipeline is: split (see [`DocumentStream`]) -> parse
//! (YAML or JSON) -> resolve against a [`TypeRegistry`] (typed on a match,
//! [`Unstructured`](crate::object::Unstructured) otherwise) -> mutate ->
//! dispatch. Decode, mutation, and handler errors are fail-fast: they stop
//! iteration of the stream they occurred in. [`best_effort`] opts into
//! skipping malformed documents instead; handler errors can be filtered
//! with [`ignore_error_handler`].
//!
//! Multi-source variants sort matched files lexicographically before
//! decoding, so repeated runs over the same input see the same objects in
//! the same order.

mod handlers;
mod options;
mod stream;
mod yaml;

pub use handlers::{
    create_handler, delete_handler, delete_ignore_not_found, handler_fn, ignore_error_handler,
    read_handler, FnHandler, Handler,
};
pub use options::{
    best_effort, mutate_annotations, mutate_fn, mutate_labels, mutate_namespace, unstructured,
    DecodeOption,
};
pub use stream::{DocumentStream, ManifestDocument};

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::object::{ResourceObject, TypeRegistry};
use options::DecodeOptions;

/// Locator used for anonymous in-memory streams
const STREAM_LOCATOR: &str = "<stream>";

// =============================================================================
// Single-document entry points
// =============================================================================

/// Decode the first document of `reader` into a caller-supplied type.
///
/// Unknown fields in the document are tolerated.
pub async fn decode<T, R>(reader: R) -> Result<T, Error>
where
    T: DeserializeOwned,
    R: AsyncBufRead + Unpin + Send,
{
    let mut stream = DocumentStream::new(reader, STREAM_LOCATOR);
    let Some(doc) = stream.next_document().await? else {
        return Err(Error::decode(
            STREAM_LOCATOR,
            0,
            "stream contains no documents",
        ));
    };
    let value = yaml::parse_document(doc.content())
        .map_err(|e| Error::decode(doc.source(), doc.index(), brief(&e)))?;
    serde_json::from_value(value)
        .map_err(|e| Error::decode(doc.source(), doc.index(), e.to_string()))
}

/// Decode the first document of `reader` through the registry, applying
/// `options`, and return whichever representation it resolved to.
pub async fn decode_any<R>(
    reader: R,
    registry: &TypeRegistry,
    options: Vec<DecodeOption>,
) -> Result<Box<dyn ResourceObject>, Error>
where
    R: AsyncBufRead + Unpin + Send,
{
    let opts = DecodeOptions::build(options);
    let mut stream = DocumentStream::new(reader, STREAM_LOCATOR);
    let Some(doc) = stream.next_document().await? else {
        return Err(Error::decode(
            STREAM_LOCATOR,
            0,
            "stream contains no documents",
        ));
    };
    let mut obj = resolve_document(&doc, registry, &opts)?;
    apply_options(&mut *obj, &opts)?;
    Ok(obj)
}

/// Decode one file's first document into a typed resource, applying `options`
pub async fn decode_file<T>(path: impl AsRef<Path>, options: Vec<DecodeOption>) -> Result<T, Error>
where
    T: ResourceObject + DeserializeOwned,
{
    let path = path.as_ref();
    let locator = path.display().to_string();
    let file = tokio::fs::File::open(path).await?;
    let mut stream = DocumentStream::new(BufReader::new(file), locator.clone());
    let Some(doc) = stream.next_document().await? else {
        return Err(Error::decode(locator, 0, "file contains no documents"));
    };
    let value = yaml::parse_document(doc.content())
        .map_err(|e| Error::decode(doc.source(), doc.index(), brief(&e)))?;
    let mut obj: T = serde_json::from_value(value)
        .map_err(|e| Error::decode(doc.source(), doc.index(), e.to_string()))?;
    let opts = DecodeOptions::build(options);
    apply_options(&mut obj, &opts)?;
    Ok(obj)
}

// =============================================================================
// Streaming and collecting entry points
// =============================================================================

/// Decode every document of `reader`, visiting each resolved object with
/// `handler`. Stops at the first decode, mutation, or handler error.
pub async fn decode_each<R, H>(
    ctx: &CancellationToken,
    reader: R,
    registry: &TypeRegistry,
    handler: &H,
    options: Vec<DecodeOption>,
) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin + Send,
    H: Handler + ?Sized,
{
    let opts = DecodeOptions::build(options);
    decode_stream(ctx, reader, STREAM_LOCATOR, registry, handler, &opts).await
}

/// Decode every document of `reader` into an ordered sequence.
///
/// All-or-nothing: any failing document fails the whole call and no partial
/// results are returned.
pub async fn decode_all<R>(
    ctx: &CancellationToken,
    reader: R,
    registry: &TypeRegistry,
    options: Vec<DecodeOption>,
) -> Result<Vec<Box<dyn ResourceObject>>, Error>
where
    R: AsyncBufRead + Unpin + Send,
{
    let opts = DecodeOptions::build(options);
    let collected = Mutex::new(Vec::new());
    let collector = handler_fn(|_ctx, obj| {
        let collected = &collected;
        async move {
            collected.lock().await.push(obj);
            Ok::<(), Error>(())
        }
    });
    decode_stream(ctx, reader, STREAM_LOCATOR, registry, &collector, &opts).await?;
    Ok(collected.into_inner())
}

/// Decode every file under `dir` whose path relative to `dir` matches the
/// glob-style `pattern` (e.g. `"fixture-*"` or `"*"`), visiting each object
/// with `handler`.
///
/// Matched files are sorted lexicographically before decoding, so repeated
/// runs over the same subtree produce the same sequence.
pub async fn decode_each_file<H>(
    ctx: &CancellationToken,
    dir: impl AsRef<Path>,
    pattern: &str,
    registry: &TypeRegistry,
    handler: &H,
    options: Vec<DecodeOption>,
) -> Result<(), Error>
where
    H: Handler + ?Sized,
{
    let opts = DecodeOptions::build(options);
    for path in matching_files(dir.as_ref(), pattern)? {
        let locator = path.display().to_string();
        debug!(file = %locator, "decoding manifest file");
        let file = tokio::fs::File::open(&path).await?;
        decode_stream(
            ctx,
            BufReader::new(file),
            &locator,
            registry,
            handler,
            &opts,
        )
        .await?;
    }
    Ok(())
}

/// Decode every matching file under `dir` into one ordered sequence.
///
/// Same matching and ordering rules as [`decode_each_file`]; all-or-nothing
/// like [`decode_all`].
pub async fn decode_all_files(
    ctx: &CancellationToken,
    dir: impl AsRef<Path>,
    pattern: &str,
    registry: &TypeRegistry,
    options: Vec<DecodeOption>,
) -> Result<Vec<Box<dyn ResourceObject>>, Error> {
    let opts = DecodeOptions::build(options);
    let collected = Mutex::new(Vec::new());
    let collector = handler_fn(|_ctx, obj| {
        let collected = &collected;
        async move {
            collected.lock().await.push(obj);
            Ok::<(), Error>(())
        }
    });
    for path in matching_files(dir.as_ref(), pattern)? {
        let locator = path.display().to_string();
        let file = tokio::fs::File::open(&path).await?;
        decode_stream(
            ctx,
            BufReader::new(file),
            &locator,
            registry,
            &collector,
            &opts,
        )
        .await?;
    }
    Ok(collected.into_inner())
}

/// Fetch a manifest stream over HTTP(S) and decode every document,
/// visiting each object with `handler`
pub async fn decode_url<H>(
    ctx: &CancellationToken,
    url: &str,
    registry: &TypeRegistry,
    handler: &H,
    options: Vec<DecodeOption>,
) -> Result<(), Error>
where
    H: Handler + ?Sized,
{
    let opts = DecodeOptions::build(options);
    debug!(%url, "fetching manifest stream");
    let body = tokio::select! {
        () = ctx.cancelled() => return Err(Error::Cancelled),
        result = fetch_url(url) => result?,
    };
    decode_stream(ctx, body.as_bytes(), url, registry, handler, &opts).await
}

async fn fetch_url(url: &str) -> Result<String, Error> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.text().await?)
}

// =============================================================================
// Pipeline internals
// =============================================================================

async fn decode_stream<R, H>(
    ctx: &CancellationToken,
    reader: R,
    locator: &str,
    registry: &TypeRegistry,
    handler: &H,
    opts: &DecodeOptions,
) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin + Send,
    H: Handler + ?Sized,
{
    let mut stream = DocumentStream::new(reader, locator);
    loop {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(doc) = stream.next_document().await? else {
            return Ok(());
        };
        let mut obj = match resolve_document(&doc, registry, opts) {
            Ok(obj) => obj,
            Err(err) if opts.best_effort => {
                warn!(
                    locator = doc.source(),
                    index = doc.index(),
                    error = %err,
                    "skipping malformed document"
                );
                continue;
            }
            Err(err) => return Err(err),
        };
        apply_options(&mut *obj, opts)?;
        handler.handle(ctx.clone(), obj).await?;
    }
}

fn resolve_document(
    doc: &ManifestDocument,
    registry: &TypeRegistry,
    opts: &DecodeOptions,
) -> Result<Box<dyn ResourceObject>, Error> {
    let value = yaml::parse_document(doc.content())
        .map_err(|e| Error::decode(doc.source(), doc.index(), brief(&e)))?;
    registry
        .resolve(value, opts.force_unstructured)
        .map_err(|e| Error::decode(doc.source(), doc.index(), brief(&e)))
}

/// Run the mutation chain and verify the object's identity survived it
fn apply_options(obj: &mut dyn ResourceObject, opts: &DecodeOptions) -> Result<(), Error> {
    let identity = obj.gvk();
    opts.apply(obj)?;
    if obj.gvk() != identity {
        return Err(Error::mutation(
            "pipeline",
            format!(
                "mutation changed object identity from {identity} to {}",
                obj.gvk()
            ),
        ));
    }
    Ok(())
}

/// Collect the files under `dir` whose dir-relative path matches `pattern`,
/// sorted lexicographically. Wildcards do not cross directory separators,
/// so `*` matches only direct children.
fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let compiled = Pattern::new(pattern).map_err(|e| {
        Error::serialization(format!("invalid file pattern {pattern:?}: {e}"))
    })?;
    let match_opts = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or_else(|_| entry.path());
        if compiled.matches_path_with(relative, match_opts) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn brief(err: &Error) -> String {
    match err {
        Error::Serialization(msg) => msg.clone(),
        other => other.to_string(),
    }
}
