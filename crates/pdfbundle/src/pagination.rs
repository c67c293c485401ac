//! Shared pagination rules.
//!
//! Every component that prints or predicts a page number goes through this
//! module: the estimator, the index renderer, the assembler's footers and the
//! link resolver. Keeping the late-addition branching and the index capacity
//! arithmetic in one place is what keeps the render-time and link-time walks
//! of the index identical.

use std::fmt;

use crate::config::{BundleDocument, DateFormat};

/// Width of every generated page (A4, points).
pub const PAGE_WIDTH: f32 = 595.28;

/// Height of every generated page (A4, points).
pub const PAGE_HEIGHT: f32 = 841.89;

/// Vertical space consumed by one index row.
pub const ROW_HEIGHT: f32 = 18.0;

/// Lowest Y an index row may occupy.
pub const BOTTOM_MARGIN: f32 = 50.0;

/// Rows available on every index page after the first.
pub const CONTINUATION_CAPACITY: usize = 40;

/// Y of the column header row on continuation index pages.
pub const CONTINUATION_HEADER_Y: f32 = PAGE_HEIGHT - 60.0;

/// Human-visible page identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLabel {
    /// Position in the running bundle numbering.
    Number(u32),
    /// Local numbering of a late addition, e.g. `A3`.
    Late {
        /// Letter (or short string) prefix.
        prefix: String,
        /// 1-based page within the document.
        page: u32,
    },
}

impl fmt::Display for PageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Late { prefix, page } => write!(f, "{prefix}{page}"),
        }
    }
}

impl PageLabel {
    /// Footer text for a page carrying this label.
    pub fn footer_text(&self) -> String {
        format!("Page {self}")
    }
}

/// Whether pages of `doc` consume numbers from the running counter.
pub fn advances_counter(doc: &BundleDocument) -> bool {
    !doc.is_late_addition
}

/// Label for the page at `local_index` (0-based) within `doc`, given the
/// running counter value for that page.
pub fn page_label(doc: &BundleDocument, local_index: usize, counter: u32) -> PageLabel {
    if doc.is_late_addition {
        PageLabel::Late {
            prefix: doc.late_prefix.clone(),
            page: local_index as u32 + 1,
        }
    } else {
        PageLabel::Number(counter)
    }
}

/// Label shown in the index page column for `doc`.
///
/// Late additions always show their first local page, whatever their length.
pub fn index_label(doc: &BundleDocument, start_page: u32) -> PageLabel {
    page_label(doc, 0, start_page)
}

/// Rearrange a stored `YYYY-MM-DD` date for display.
///
/// Anything that is not exactly three hyphen-separated numeric parts is
/// returned unchanged.
pub fn format_date(date: &str, format: DateFormat) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return date.to_string();
    };
    if !parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit())) {
        return date.to_string();
    }

    match format {
        DateFormat::DayMonthYear => format!("{day}-{month}-{year}"),
        DateFormat::MonthDayYear => format!("{month}-{day}-{year}"),
        DateFormat::Iso => date.to_string(),
    }
}

/// How many index rows each index page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCapacity {
    /// Rows on the first index page.
    pub first: usize,
    /// Rows on every continuation page.
    pub continuation: usize,
}

impl IndexCapacity {
    /// Capacity for a first page whose header row sits at `list_start_y`.
    pub fn for_list_start(list_start_y: f32) -> Self {
        Self {
            first: first_page_capacity(list_start_y),
            continuation: CONTINUATION_CAPACITY,
        }
    }

    /// Rows available on index page `page` (0-based).
    pub fn rows_on(&self, page: usize) -> usize {
        if page == 0 {
            self.first
        } else {
            self.continuation
        }
    }

    /// Index pages needed for `entries` rows. Always at least one.
    pub fn pages_needed(&self, entries: usize) -> usize {
        if entries <= self.first {
            return 1;
        }
        let overflow = entries - self.first;
        1 + overflow.div_ceil(self.continuation.max(1))
    }

    /// Split `entries` rows across index pages, in order.
    ///
    /// Element `i` is the range of entries placed on index page `i`. A first
    /// page with no capacity yields an empty range. Both the renderer and the
    /// link resolver place rows through this, so their walks cannot diverge.
    pub fn partition(&self, entries: usize) -> Vec<std::ops::Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        let mut page = 0;

        while start < entries {
            let end = (start + self.rows_on(page)).min(entries);
            ranges.push(start..end);
            start = end;
            page += 1;
        }

        ranges
    }
}

/// Where one index row lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSlot {
    /// Index page (0-based) the row is drawn on.
    pub page: usize,
    /// Baseline Y of the row.
    pub y: f32,
}

impl IndexCapacity {
    /// Slot for every one of `entries` rows, in entry order.
    pub fn slots(&self, entries: usize, list_start_y: f32) -> Vec<RowSlot> {
        self.partition(entries)
            .into_iter()
            .enumerate()
            .flat_map(|(page, range)| {
                let header = header_y(page, list_start_y);
                (0..range.len()).map(move |row| RowSlot {
                    page,
                    y: row_y(header, row),
                })
            })
            .collect()
    }
}

/// Y of the column header row on index page `page` (0-based).
pub fn header_y(page: usize, list_start_y: f32) -> f32 {
    if page == 0 {
        list_start_y
    } else {
        CONTINUATION_HEADER_Y
    }
}

/// Rows that fit between the first page's header row and the bottom margin.
pub fn first_page_capacity(list_start_y: f32) -> usize {
    let rows = ((list_start_y - BOTTOM_MARGIN) / ROW_HEIGHT).floor();
    if rows.is_finite() && rows > 0.0 {
        rows as usize
    } else {
        0
    }
}

/// Y coordinate of row `row` (0-based) under a header at `header_y`.
pub fn row_y(header_y: f32, row: usize) -> f32 {
    header_y - (row as f32 + 1.0) * ROW_HEIGHT
}
