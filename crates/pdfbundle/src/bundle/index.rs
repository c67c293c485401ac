//! Index page rendering.
//!
//! Index entries are derived fresh from the configuration and the plan on
//! every build. Their placement on pages comes from
//! [`IndexCapacity::slots`], which the link resolver also walks.

use lopdf::ObjectId;

use crate::bundle::document::OutputDocument;
use crate::bundle::estimator::{BundlePlan, DocumentKey};
use crate::bundle::text::{FontStyle, TextRun, truncate_to_width};
use crate::config::BundleConfig;
use crate::error::Result;
use crate::pagination::{PAGE_HEIGHT, PAGE_WIDTH, PageLabel, format_date, header_y};

/// X of the document name column and of section headings.
pub const NAME_X: f32 = 50.0;

/// X of document names, indented under their heading.
pub const DOCUMENT_NAME_X: f32 = 60.0;

/// X of the date column.
pub const DATE_X: f32 = 400.0;

/// X of the page column.
pub const PAGE_X: f32 = 500.0;

const TITLE: &str = "INDEX";
const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 11.0;
const ROW_SIZE: f32 = 10.0;
const COLUMN_GAP: f32 = 10.0;

/// One row of the index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEntry {
    /// A section title.
    Heading {
        /// Upper-cased section title.
        title: String,
    },
    /// A document with its page label.
    Document {
        /// Position of the document in the configuration.
        key: DocumentKey,
        /// Display name.
        name: String,
        /// Formatted date.
        date: String,
        /// Label of the document's first page.
        label: PageLabel,
    },
}

/// Build the index rows for `config`: each section heading followed by its
/// documents, in configuration order.
pub fn index_entries(config: &BundleConfig, plan: &BundlePlan) -> Vec<IndexEntry> {
    let mut entries = Vec::with_capacity(plan.total_entries);

    for (s, section) in config.sections.iter().enumerate() {
        entries.push(IndexEntry::Heading {
            title: section.title.to_uppercase(),
        });

        for (d, doc) in section.documents.iter().enumerate() {
            let key = DocumentKey::new(s, d);
            let Some(label) = plan.index_label(config, key) else {
                continue;
            };
            entries.push(IndexEntry::Document {
                key,
                name: doc.name.clone(),
                date: format_date(&doc.date, config.date_format),
                label,
            });
        }
    }

    entries
}

/// Append the index pages to `output`.
///
/// Renders exactly `plan.index_pages` pages and returns their ids in order.
///
/// # Errors
///
/// Returns an error if a page cannot be added.
pub fn render_index(
    output: &mut OutputDocument,
    config: &BundleConfig,
    plan: &BundlePlan,
    entries: &[IndexEntry],
) -> Result<Vec<ObjectId>> {
    let list_start_y = config.index_layout.list_start_y;
    let slots = plan.capacity.slots(entries.len(), list_start_y);

    let mut pages: Vec<Vec<TextRun>> = (0..plan.index_pages)
        .map(|page| column_headers(header_y(page, list_start_y)))
        .collect();

    if let Some(first) = pages.first_mut() {
        first.push(TextRun::centred(TITLE, PAGE_WIDTH, PAGE_HEIGHT - 50.0, TITLE_SIZE, FontStyle::Bold));
        first.extend(config.index_layout.items.iter().map(|item| {
            TextRun::regular(item.resolve_text(config), item.x, item.y, ROW_SIZE)
        }));
    }

    for (entry, slot) in entries.iter().zip(&slots) {
        let Some(runs) = pages.get_mut(slot.page) else {
            tracing::warn!(page = slot.page, "index row falls beyond the planned index pages");
            continue;
        };
        runs.extend(entry_runs(entry, slot.y));
    }

    let ids = pages
        .iter()
        .map(|runs| output.add_page(runs))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(pages = ids.len(), rows = entries.len(), "rendered index");
    Ok(ids)
}

fn column_headers(y: f32) -> Vec<TextRun> {
    vec![
        TextRun::bold("Document Name", NAME_X, y, ROW_SIZE),
        TextRun::bold("Date", DATE_X, y, ROW_SIZE),
        TextRun::bold("Page", PAGE_X, y, ROW_SIZE),
    ]
}

fn entry_runs(entry: &IndexEntry, y: f32) -> Vec<TextRun> {
    match entry {
        IndexEntry::Heading { title } => {
            let title = truncate_to_width(title, PAGE_X - NAME_X - COLUMN_GAP, HEADING_SIZE, FontStyle::Bold);
            vec![TextRun::bold(title, NAME_X, y, HEADING_SIZE)]
        }
        IndexEntry::Document {
            name, date, label, ..
        } => {
            let name = truncate_to_width(
                name,
                DATE_X - DOCUMENT_NAME_X - COLUMN_GAP,
                ROW_SIZE,
                FontStyle::Regular,
            );
            let date = if date.is_empty() { "-" } else { date.as_str() };
            vec![
                TextRun::regular(name, DOCUMENT_NAME_X, y, ROW_SIZE),
                TextRun::regular(date, DATE_X, y, ROW_SIZE),
                TextRun::regular(label.to_string(), PAGE_X, y, ROW_SIZE),
            ]
        }
    }
}
