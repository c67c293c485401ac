//! Page-budget estimation.
//!
//! Predicts, before any page exists, how many index pages the bundle needs
//! and the page number every document will start on. The prediction is plain
//! data; nothing here touches a PDF object.

use std::collections::BTreeMap;

use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::pagination::{IndexCapacity, PageLabel, advances_counter, index_label};

/// Position of a document in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    /// Section index.
    pub section: usize,
    /// Document index within the section.
    pub document: usize,
}

impl DocumentKey {
    /// Create a key.
    pub fn new(section: usize, document: usize) -> Self {
        Self { section, document }
    }
}

/// Predicted page layout of a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct BundlePlan {
    /// Index pages the bundle opens with.
    pub index_pages: usize,
    /// Rows per index page.
    pub capacity: IndexCapacity,
    /// Index rows: one heading per section plus one row per document.
    pub total_entries: usize,
    /// Page number of each section's separator page, by section index.
    pub separator_pages: Vec<u32>,
    /// Running counter value at each document's first page.
    pub start_pages: BTreeMap<DocumentKey, u32>,
    /// Counter value after the last numbered page.
    pub next_page: u32,
}

impl BundlePlan {
    /// Predict the layout of `config`.
    ///
    /// The counter starts after the index pages. Each section takes one
    /// separator page, then each of its documents starts at the current
    /// counter. Only documents that are not late additions advance it.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::InvalidConfig`] if the page numbers would not
    /// fit in a `u32`.
    pub fn estimate(config: &BundleConfig) -> Result<Self> {
        let capacity = IndexCapacity::for_list_start(config.index_layout.list_start_y);
        let total_entries = count_entries(config);
        let index_pages = capacity.pages_needed(total_entries);

        let mut counter = u32::try_from(index_pages)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| BundleError::invalid_config("Too many index entries"))?;
        let mut separator_pages = Vec::with_capacity(config.sections.len());
        let mut start_pages = BTreeMap::new();

        for (s, section) in config.sections.iter().enumerate() {
            separator_pages.push(counter);
            counter = advance(counter, 1, &section.title)?;

            for (d, doc) in section.documents.iter().enumerate() {
                start_pages.insert(DocumentKey::new(s, d), counter);
                if advances_counter(doc) {
                    counter = advance(counter, doc.page_count, &doc.name)?;
                }
            }
        }

        tracing::debug!(
            index_pages,
            total_entries,
            first_page_rows = capacity.first,
            last_page = counter - 1,
            "estimated bundle layout"
        );

        Ok(Self {
            index_pages,
            capacity,
            total_entries,
            separator_pages,
            start_pages,
            next_page: counter,
        })
    }

    /// Predicted counter value at the first page of `key`.
    pub fn start_page(&self, key: DocumentKey) -> Option<u32> {
        self.start_pages.get(&key).copied()
    }

    /// Label shown in the index for the document at `key`.
    pub fn index_label(&self, config: &BundleConfig, key: DocumentKey) -> Option<PageLabel> {
        let doc = config.sections.get(key.section)?.documents.get(key.document)?;
        Some(index_label(doc, self.start_page(key)?))
    }

    /// Total numbered pages the bundle is predicted to contain.
    pub fn numbered_pages(&self) -> u32 {
        self.next_page - 1
    }
}

fn advance(counter: u32, pages: usize, name: &str) -> Result<u32> {
    u32::try_from(pages)
        .ok()
        .and_then(|pages| counter.checked_add(pages))
        .ok_or_else(|| {
            BundleError::invalid_config(format!(
                "Page numbering overflows at '{name}' ({pages} pages)"
            ))
        })
}

/// Index rows needed for `config`: one per section and one per document.
pub fn count_entries(config: &BundleConfig) -> usize {
    config.sections.len() + config.document_count()
}
