//! Bundle writing and saving operations.
//!
//! This module provides safe PDF writing with:
//! - Atomic writes (write to temp file, then rename)
//! - In-memory serialization for callers that deliver bytes themselves
//! - Overwrite checks
//! - Write statistics
//!
//! # Examples
//!
//! ```no_run
//! use pdfbundle::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! writer.save(&doc, Path::new("Bundle-CV-42.pdf")).await?;
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{BundleError, Result};

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Serialize a document to PDF bytes.
///
/// # Errors
///
/// Returns [`BundleError::GenerationFailed`] if serialization fails.
pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| BundleError::generation_failed(format!("Failed to serialize bundle: {e}")))?;
    Ok(buffer)
}

/// PDF writer with configurable behavior.
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self {
            options: WriteOptions::default(),
        }
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer without atomic writes.
    pub fn non_atomic() -> Self {
        Self {
            options: WriteOptions {
                atomic: false,
                ..Default::default()
            },
        }
    }

    /// Save a PDF document to a file.
    ///
    /// # Arguments
    ///
    /// * `doc` - PDF document to save
    /// * `path` - Output file path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory doesn't exist
    /// - Insufficient permissions
    /// - Write operation fails
    pub async fn save(&self, doc: &Document, path: &Path) -> Result<()> {
        let _stats = self.save_with_stats(doc, path).await?;
        Ok(())
    }

    /// Save a PDF and return statistics about the operation.
    ///
    /// The document is cloned and serialized on a blocking thread.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfbundle::io::writer::PdfWriter;
    /// # use lopdf::Document;
    /// # use std::path::Path;
    /// # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
    /// let writer = PdfWriter::new();
    /// let stats = writer.save_with_stats(&doc, Path::new("bundle.pdf")).await?;
    /// println!("Wrote {} in {:?}", stats.format_file_size(), stats.write_time);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn save_with_stats(&self, doc: &Document, path: &Path) -> Result<WriteStatistics> {
        let mut doc_clone = doc.clone();
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            write_atomically(&options, &path_buf, |writer, write_path| {
                doc_clone
                    .save_to(writer)
                    .map_err(|e| BundleError::FailedToWrite {
                        path: write_path.to_path_buf(),
                        source: std::io::Error::other(e),
                    })
                    .map(|_| ())
            })
        })
        .await
        .map_err(|e| BundleError::other(format!("Write task failed: {e}")))?
    }

    /// Save already serialized PDF bytes to a file.
    ///
    /// # Errors
    ///
    /// Same as [`PdfWriter::save`].
    pub async fn save_bytes(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            write_atomically(&options, &path_buf, |writer, write_path| {
                writer
                    .write_all(&bytes)
                    .map_err(|e| BundleError::FailedToWrite {
                        path: write_path.to_path_buf(),
                        source: e,
                    })
            })
        })
        .await
        .map_err(|e| BundleError::other(format!("Write task failed: {e}")))?
    }

    /// Check if a file can be written to the given path.
    ///
    /// Performs pre-flight checks without actually writing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory doesn't exist
    /// - Parent directory is not writable
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        if !parent.exists() {
            return Err(BundleError::invalid_config(format!(
                "Output directory does not exist: {}",
                parent.display()
            )));
        }

        let metadata = tokio::fs::metadata(parent)
            .await
            .map_err(|e| BundleError::FileNotAccessible {
                path: parent.to_path_buf(),
                source: e,
            })?;

        if metadata.permissions().readonly() {
            return Err(BundleError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_atomically<F>(options: &WriteOptions, path: &Path, write: F) -> Result<WriteStatistics>
where
    F: FnOnce(&mut std::io::BufWriter<std::fs::File>, &Path) -> Result<()>,
{
    let start = Instant::now();

    let write_path = if options.atomic {
        path.with_extension("tmp")
    } else {
        path.to_path_buf()
    };

    let file = std::fs::File::create(&write_path).map_err(|e| BundleError::FailedToCreateOutput {
        path: write_path.clone(),
        source: e,
    })?;

    let mut writer = std::io::BufWriter::with_capacity(options.buffer_size, file);
    let written = write(&mut writer, &write_path).and_then(|()| {
        writer.flush().map_err(|e| BundleError::FailedToWrite {
            path: write_path.clone(),
            source: e,
        })
    });

    if let Err(e) = written {
        if options.atomic {
            let _ = std::fs::remove_file(&write_path);
        }
        return Err(e);
    }

    if options.atomic {
        std::fs::rename(&write_path, path).map_err(|e| BundleError::FailedToWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    Ok(WriteStatistics {
        write_time: start.elapsed(),
        file_size,
        output_path: path.to_path_buf(),
    })
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
