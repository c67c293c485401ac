//! Index-to-document navigation links.
//!
//! Runs after assembly. Row positions are recomputed from the entries and
//! the plan's capacity exactly as the renderer placed them; link targets come
//! only from the first-page references recorded during assembly, never from
//! predicted page numbers.

use std::collections::HashMap;

use lopdf::ObjectId;

use crate::bundle::document::OutputDocument;
use crate::bundle::estimator::{BundlePlan, DocumentKey};
use crate::bundle::index::{IndexEntry, NAME_X};
use crate::error::Result;
use crate::pagination::{PAGE_WIDTH, ROW_HEIGHT};

/// Space below the row baseline covered by the link.
const DESCENT: f32 = 4.0;

/// Attach a link over every document row whose document contributed pages.
///
/// Returns the number of links added. Rows without a recorded first page are
/// left unlinked.
///
/// # Errors
///
/// Returns an error if an index page cannot be updated.
pub fn resolve_links(
    output: &mut OutputDocument,
    plan: &BundlePlan,
    list_start_y: f32,
    entries: &[IndexEntry],
    index_pages: &[ObjectId],
    first_pages: &HashMap<DocumentKey, ObjectId>,
) -> Result<usize> {
    let slots = plan.capacity.slots(entries.len(), list_start_y);
    let mut added = 0;

    for (entry, slot) in entries.iter().zip(&slots) {
        let IndexEntry::Document { key, .. } = entry else {
            continue;
        };
        let Some(&target) = first_pages.get(key) else {
            continue;
        };
        let Some(&index_page) = index_pages.get(slot.page) else {
            continue;
        };

        let rect = row_rect(slot.y);
        output.add_link(index_page, rect, target)?;
        added += 1;
    }

    tracing::debug!(links = added, "resolved index links");
    Ok(added)
}

/// Clickable rectangle of a row whose baseline is at `y`.
pub fn row_rect(y: f32) -> [f32; 4] {
    [NAME_X, y - DESCENT, PAGE_WIDTH - NAME_X, y - DESCENT + ROW_HEIGHT]
}
