//! Multi-document stream splitting
//!
//! [`DocumentStream`] turns a byte stream into a lazy, single-pass sequence
//! of [`ManifestDocument`]s. Documents are separated by a line that is
//! exactly `---`, optionally followed by trailing whitespace and/or a `#`
//! comment. Documents that are empty or contain only blank and comment
//! lines are discarded silently: they are not surfaced and do not count
//! toward document ordinals.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::trace;

use crate::error::Error;

/// One decoded unit of a manifest stream: raw text plus its provenance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestDocument {
    content: String,
    source: String,
    index: usize,
}

impl ManifestDocument {
    /// Raw text of the document
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Locator of the stream this document came from (path, URL, or stream name)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Zero-based ordinal of this document among the non-empty documents of
    /// its stream
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Lazy splitter over a byte stream.
///
/// Single-pass: the underlying reader is consumed as documents are pulled.
pub struct DocumentStream<R> {
    lines: Lines<R>,
    source: String,
    next_index: usize,
    exhausted: bool,
}

impl<R> DocumentStream<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wrap a reader, tagging every yielded document with `source`
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            source: source.into(),
            next_index: 0,
            exhausted: false,
        }
    }

    /// Pull the next non-empty document, or `None` at end of stream.
    ///
    /// An empty stream yields `None` immediately; that is not an error.
    pub async fn next_document(&mut self) -> Result<Option<ManifestDocument>, Error> {
        while !self.exhausted {
            let mut chunk = String::new();
            loop {
                match self.lines.next_line().await? {
                    None => {
                        self.exhausted = true;
                        break;
                    }
                    Some(line) if is_separator(&line) => break,
                    Some(line) => {
                        chunk.push_str(&line);
                        chunk.push('\n');
                    }
                }
            }
            if is_discardable(&chunk) {
                trace!(source = %self.source, "skipping empty or comment-only document");
                continue;
            }
            let doc = ManifestDocument {
                content: chunk,
                source: self.source.clone(),
                index: self.next_index,
            };
            self.next_index += 1;
            return Ok(Some(doc));
        }
        Ok(None)
    }
}

/// A document separator is a line that is exactly `---`, optionally followed
/// by whitespace and/or a comment. `----` or `--- value` are content lines.
fn is_separator(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("---") else {
        return false;
    };
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

/// True when the chunk has no content lines (only blanks and comments)
fn is_discardable(chunk: &str) -> bool {
    chunk.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    })
}
