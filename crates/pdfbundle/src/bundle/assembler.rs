//! Bundle body assembly.
//!
//! Writes one separator page per section followed by the pages of each of
//! its documents, stamping every page with its footer label. Documents are
//! imported strictly one after another: the running page counter and the
//! first-page references depend on that order.

use std::collections::HashMap;

use lopdf::ObjectId;

use crate::bundle::document::OutputDocument;
use crate::bundle::estimator::DocumentKey;
use crate::bundle::text::{FontStyle, TextRun};
use crate::config::{BundleConfig, BundleDocument, Section};
use crate::error::Result;
use crate::io::reader::SourceLoader;
use crate::pagination::{PAGE_HEIGHT, PAGE_WIDTH, PageLabel, advances_counter, page_label};

const SEPARATOR_TITLE_SIZE: f32 = 24.0;

/// Where each document's pages ended up.
#[derive(Debug, Default)]
pub struct AssemblyReport {
    /// First imported page of every document that contributed pages.
    pub first_pages: HashMap<DocumentKey, ObjectId>,
    /// Separator pages written.
    pub separator_pages: usize,
    /// Source pages imported.
    pub body_pages: usize,
    /// Documents whose pages were imported.
    pub documents_imported: usize,
    /// Documents skipped for lack of source bytes.
    pub documents_skipped: usize,
    /// Counter value after the last numbered page.
    pub next_page: u32,
}

/// Writes sections and their documents into the output.
pub struct Assembler {
    loader: SourceLoader,
}

impl Assembler {
    /// Create an assembler that loads sources with `loader`.
    pub fn new(loader: SourceLoader) -> Self {
        Self { loader }
    }

    /// Append every section of `config` to `output`.
    ///
    /// `first_page` is the counter value of the first separator page, i.e.
    /// one past the last index page.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed, its page count
    /// disagrees with the configuration while verification is on, or a page
    /// cannot be written. Nothing is returned for a failed build.
    pub async fn assemble(
        &self,
        output: &mut OutputDocument,
        config: &BundleConfig,
        first_page: u32,
    ) -> Result<AssemblyReport> {
        let mut report = AssemblyReport::default();
        let mut counter = first_page;

        for (s, section) in config.sections.iter().enumerate() {
            counter = self.write_separator(output, section, counter)?;
            report.separator_pages += 1;

            for (d, doc) in section.documents.iter().enumerate() {
                let key = DocumentKey::new(s, d);
                counter = self.write_document(output, doc, key, counter, &mut report)?;

                // Imports are CPU bound; let other tasks run between documents.
                tokio::task::yield_now().await;
            }
        }

        report.next_page = counter;
        Ok(report)
    }

    fn write_separator(&self, output: &mut OutputDocument, section: &Section, counter: u32) -> Result<u32> {
        let runs = [
            TextRun::centred(
                section.title.to_uppercase(),
                PAGE_WIDTH,
                PAGE_HEIGHT / 2.0,
                SEPARATOR_TITLE_SIZE,
                FontStyle::Bold,
            ),
        ];

        let page_id = output.add_page(&runs)?;
        output.stamp_footer(page_id, &PageLabel::Number(counter))?;

        tracing::debug!(section = %section.title, page = counter, "wrote separator page");
        Ok(counter + 1)
    }

    fn write_document(
        &self,
        output: &mut OutputDocument,
        doc: &BundleDocument,
        key: DocumentKey,
        mut counter: u32,
        report: &mut AssemblyReport,
    ) -> Result<u32> {
        let Some(source) = self.loader.load(doc)? else {
            tracing::warn!(document = %doc.name, "document has no source bytes; skipping");
            report.documents_skipped += 1;
            return Ok(counter);
        };

        let page_ids = output.import_pages(source.document)?;

        for (local, &page_id) in page_ids.iter().enumerate() {
            output.stamp_footer(page_id, &page_label(doc, local, counter))?;
            if advances_counter(doc) {
                counter += 1;
            }
        }

        if let Some(&first) = page_ids.first() {
            report.first_pages.insert(key, first);
        }
        report.body_pages += page_ids.len();
        report.documents_imported += 1;

        tracing::debug!(
            document = %doc.name,
            pages = page_ids.len(),
            load_time = ?source.load_time,
            "imported document"
        );
        Ok(counter)
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(SourceLoader::default())
    }
}
