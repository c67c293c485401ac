//! Source document loading.
//!
//! This module turns a document's bytes into an independent `lopdf` object
//! graph ready to be copied into a bundle, and provides the page-count probe
//! used at intake:
//! - Resolving bytes from the live handle or the stored base64 form
//! - Parsing with page-count reconciliation
//! - Concurrent probing of files on disk
//!
//! # Examples
//!
//! ```no_run
//! use pdfbundle::io::reader::probe_page_count;
//!
//! # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let pages = probe_page_count(bytes)?;
//! println!("{pages} page(s)");
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::{BundleDocument, strip_pdf_extension};
use crate::error::{BundleError, Result};

/// A parsed source document.
#[derive(Debug)]
pub struct LoadedSource {
    /// The parsed object graph, owned exclusively by the caller.
    pub document: Document,

    /// Number of pages actually present.
    pub page_count: usize,

    /// Size of the source bytes.
    pub byte_len: usize,

    /// Time taken to parse.
    pub load_time: Duration,
}

/// Count the pages in a PDF held in memory.
///
/// The bytes are only read; nothing is retained.
///
/// # Errors
///
/// Returns [`BundleError::MalformedSource`] if the bytes are not a PDF.
pub fn probe_page_count(bytes: &[u8]) -> Result<usize> {
    let doc =
        Document::load_mem(bytes).map_err(|e| BundleError::malformed_source("document", e.to_string()))?;
    Ok(doc.get_pages().len())
}

/// Loader for the documents of a bundle.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    /// Whether a page-count disagreement is an error.
    verify_page_counts: bool,
}

impl SourceLoader {
    /// Create a loader that rejects page-count mismatches.
    pub fn new() -> Self {
        Self {
            verify_page_counts: true,
        }
    }

    /// Create a loader that only warns about page-count mismatches.
    pub fn permissive() -> Self {
        Self {
            verify_page_counts: false,
        }
    }

    /// Create a loader with explicit verification behavior.
    pub fn with_verification(verify_page_counts: bool) -> Self {
        Self { verify_page_counts }
    }

    /// Parse the bytes of `doc`.
    ///
    /// Returns `Ok(None)` when the document has no usable source bytes; such
    /// documents are skipped by the assembler rather than failing the build.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The bytes cannot be parsed as a PDF
    /// - Verification is on and the page count recorded at intake differs
    ///   from the pages actually present
    pub fn load(&self, doc: &BundleDocument) -> Result<Option<LoadedSource>> {
        let Some(bytes) = doc.source_bytes() else {
            return Ok(None);
        };

        let start = Instant::now();
        let document = Document::load_mem(&bytes)
            .map_err(|e| BundleError::malformed_source(&doc.name, e.to_string()))?;
        let page_count = document.get_pages().len();

        if page_count != doc.page_count {
            if self.verify_page_counts {
                return Err(BundleError::page_count_mismatch(
                    &doc.name,
                    doc.page_count,
                    page_count,
                ));
            }
            tracing::warn!(
                document = %doc.name,
                expected = doc.page_count,
                actual = page_count,
                "recorded page count differs from source; later page numbers will be off"
            );
        }

        Ok(Some(LoadedSource {
            document,
            page_count,
            byte_len: bytes.len(),
            load_time: start.elapsed(),
        }))
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// A file read from disk and probed for its page count.
#[derive(Debug, Clone)]
pub struct ProbedFile {
    /// Path the file was read from.
    pub path: PathBuf,
    /// Raw bytes of the file.
    pub bytes: Vec<u8>,
    /// Pages found in the file.
    pub page_count: usize,
}

impl ProbedFile {
    /// File name component of the path, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Turn the probed file into a bundle document.
    pub fn into_document(self) -> BundleDocument {
        let file_name = self.file_name();
        let mut doc = BundleDocument::new(
            strip_pdf_extension(&file_name).to_string(),
            self.page_count,
            self.bytes,
        );
        doc.original_name = file_name;
        doc
    }
}

/// Read and probe a single file.
///
/// # Errors
///
/// Returns an error if the file does not exist, is a directory, cannot be
/// read, or is not a PDF.
pub async fn probe_file(path: &Path) -> Result<ProbedFile> {
    if !path.exists() {
        return Err(BundleError::file_not_found(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(BundleError::not_a_file(path.to_path_buf()));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BundleError::FileNotAccessible {
            path: path.to_path_buf(),
            source: e,
        })?;

    let name = path.display().to_string();
    let (bytes, page_count) = tokio::task::spawn_blocking(move || {
        let count = probe_page_count(&bytes).map_err(|e| e.for_document(name))?;
        Ok::<_, BundleError>((bytes, count))
    })
    .await
    .map_err(|e| BundleError::other(format!("Probe task failed: {e}")))??;

    Ok(ProbedFile {
        path: path.to_path_buf(),
        bytes,
        page_count,
    })
}

/// Probe many files concurrently.
///
/// Uses up to `workers` concurrent probes. Results are returned in the same
/// order as `paths`.
pub async fn probe_all(paths: &[PathBuf], workers: usize) -> Vec<Result<ProbedFile>> {
    use futures::stream::{self, StreamExt};

    let workers = workers.max(1);

    let tasks = paths.iter().enumerate().map(|(idx, path)| {
        let path = path.clone();
        async move { (idx, probe_file(&path).await) }
    });

    let mut indexed: Vec<(usize, Result<ProbedFile>)> = stream::iter(tasks)
        .buffer_unordered(workers)
        .collect::<Vec<_>>()
        .await;

    // Sort by original index to maintain order
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, result)| result).collect()
}
