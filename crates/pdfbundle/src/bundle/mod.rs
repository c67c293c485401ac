//! Bundle generation.
//!
//! A build runs in a fixed order, each stage consuming what the previous
//! one produced:
//!
//! 1. [`estimator`] predicts index pages and document start pages
//! 2. [`index`] renders the index from those predictions
//! 3. [`assembler`] writes separator and body pages, recording where each
//!    document's first page landed
//! 4. [`links`] turns index rows into links to those recorded pages
//!
//! A build either returns a complete [`BuiltBundle`] or an error; no partial
//! document escapes.

pub mod assembler;
pub mod document;
pub mod estimator;
pub mod index;
pub mod links;
pub mod metadata;
pub mod text;

use std::time::{Duration, Instant};

use lopdf::Document;

use crate::config::{BuildOptions, BundleConfig, CompressionLevel};
use crate::error::Result;
use crate::io::reader::SourceLoader;
use crate::io::writer;

pub use assembler::{Assembler, AssemblyReport};
pub use document::OutputDocument;
pub use estimator::{BundlePlan, DocumentKey};
pub use index::IndexEntry;
pub use metadata::BundleMetadata;

/// Statistics about a bundle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStatistics {
    /// Index pages at the front of the bundle.
    pub index_pages: usize,
    /// Section separator pages.
    pub separator_pages: usize,
    /// Pages imported from source documents.
    pub body_pages: usize,
    /// All pages in the bundle.
    pub total_pages: usize,
    /// Documents whose pages were imported.
    pub documents_imported: usize,
    /// Documents skipped for lack of source bytes.
    pub documents_skipped: usize,
    /// Index links attached.
    pub links_added: usize,
    /// Time taken by the build.
    pub build_time: Duration,
}

/// A finished bundle.
pub struct BuiltBundle {
    /// The bundle document.
    pub document: Document,
    /// The layout the index was rendered from.
    pub plan: BundlePlan,
    /// Statistics about the build.
    pub statistics: BuildStatistics,
}

impl BuiltBundle {
    /// Serialize the bundle to PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        writer::to_bytes(&mut self.document)
    }
}

/// Builds bundles from configurations.
pub struct BundleBuilder {
    options: BuildOptions,
}

impl BundleBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self {
            options: BuildOptions::default(),
        }
    }

    /// Create a builder with custom options.
    pub fn with_options(options: BuildOptions) -> Self {
        Self { options }
    }

    /// The options this builder runs with.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the bundle described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A source document cannot be parsed
    /// - A recorded page count disagrees with the source while verification
    ///   is on
    /// - The output document cannot be written
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfbundle::bundle::BundleBuilder;
    /// # use pdfbundle::config::BundleConfig;
    /// # async fn example(config: BundleConfig) -> Result<(), Box<dyn std::error::Error>> {
    /// let mut bundle = BundleBuilder::new().build(&config).await?;
    /// println!("{} pages", bundle.statistics.total_pages);
    /// let bytes = bundle.to_bytes()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(&self, config: &BundleConfig) -> Result<BuiltBundle> {
        let start = Instant::now();

        let plan = BundlePlan::estimate(config)?;
        let entries = index::index_entries(config, &plan);

        let mut output = OutputDocument::new();
        let index_pages = index::render_index(&mut output, config, &plan, &entries)?;

        let assembler = Assembler::new(SourceLoader::with_verification(
            self.options.verify_page_counts,
        ));
        let report = assembler
            .assemble(&mut output, config, index_pages.len() as u32 + 1)
            .await?;

        let links_added = if self.options.links {
            links::resolve_links(
                &mut output,
                &plan,
                config.index_layout.list_start_y,
                &entries,
                &index_pages,
                &report.first_pages,
            )?
        } else {
            0
        };

        let total_pages = output.page_count();
        let mut document = output.into_document();

        if self.options.metadata {
            BundleMetadata::from_config(config).apply(&mut document);
        }

        match self.options.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => document.compress(),
            CompressionLevel::Maximum => {
                document.prune_objects();
                document.compress();
            }
        }

        let statistics = BuildStatistics {
            index_pages: index_pages.len(),
            separator_pages: report.separator_pages,
            body_pages: report.body_pages,
            total_pages,
            documents_imported: report.documents_imported,
            documents_skipped: report.documents_skipped,
            links_added,
            build_time: start.elapsed(),
        };

        tracing::info!(
            pages = statistics.total_pages,
            documents = statistics.documents_imported,
            skipped = statistics.documents_skipped,
            links = statistics.links_added,
            elapsed = ?statistics.build_time,
            "bundle built"
        );

        Ok(BuiltBundle {
            document,
            plan,
            statistics,
        })
    }
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build `config` with default options and serialize the result.
///
/// # Errors
///
/// Same as [`BundleBuilder::build`].
pub async fn build_bundle(config: &BundleConfig) -> Result<Vec<u8>> {
    BundleBuilder::new().build(config).await?.to_bytes()
}
