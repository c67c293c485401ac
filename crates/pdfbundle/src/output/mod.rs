//! Output formatting and display for pdfbundle.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages
//! - Validation and build summaries
//! - The page plan printed by a dry run
//!
//! # Examples
//!
//! ```no_run
//! use pdfbundle::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, true);
//! formatter.info("Building bundle");
//! formatter.success("Bundle written");
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::bundle::{BuildStatistics, BundlePlan, IndexEntry, index};
use crate::config::BundleConfig;
use crate::io::WriteStatistics;
use crate::validation::ValidationSummary;

const PLAN_WIDTHS: [usize; 3] = [48, 12, 6];

/// Display validation summary to the user.
///
/// Warnings are always shown; the totals only outside quiet mode.
pub fn display_validation_summary(formatter: &OutputFormatter, summary: &ValidationSummary) {
    for warning in &summary.warnings {
        formatter.warning(&warning.to_string());
    }

    formatter.info(&format!(
        "Validated {} section(s), {} document(s): {} declared pages",
        summary.sections, summary.documents, summary.declared_pages
    ));

    if summary.missing_sources > 0 {
        formatter.detail("Missing sources", &summary.missing_sources.to_string());
    }
}

/// Display build statistics to the user.
pub fn display_build_statistics(
    formatter: &OutputFormatter,
    stats: &BuildStatistics,
    write: Option<&WriteStatistics>,
) {
    if stats.documents_skipped > 0 {
        formatter.warning(&format!(
            "{} document(s) had no source file and were skipped",
            stats.documents_skipped
        ));
    }

    formatter.info(&format!(
        "Built {} pages from {} document(s) in {:.2}s",
        stats.total_pages,
        stats.documents_imported,
        stats.build_time.as_secs_f64()
    ));

    formatter.detail("Index pages", &stats.index_pages.to_string());
    formatter.detail("Separator pages", &stats.separator_pages.to_string());
    formatter.detail("Document pages", &stats.body_pages.to_string());
    formatter.detail("Index links", &stats.links_added.to_string());

    if let Some(write) = write {
        formatter.detail("Output size", &write.format_file_size());
        formatter.detail("Write time", &format!("{:.2}s", write.write_time.as_secs_f64()));
    }
}

/// Print the page plan of `config` as the index would list it.
pub fn display_plan(formatter: &OutputFormatter, config: &BundleConfig, plan: &BundlePlan) {
    formatter.section(&format!(
        "{} index page(s), {} separator page(s), {} numbered pages",
        plan.index_pages,
        plan.separator_pages.len(),
        plan.numbered_pages()
    ));
    formatter.blank_line();

    for row in plan_rows(config, plan) {
        let columns: Vec<&str> = row.iter().map(String::as_str).collect();
        formatter.table_row(&columns, &PLAN_WIDTHS);
    }
}

/// The rows of a plan listing: section headings with their separator page,
/// then each document's name, date and first-page label.
pub fn plan_rows(config: &BundleConfig, plan: &BundlePlan) -> Vec<[String; 3]> {
    let mut separators = plan.separator_pages.iter();

    index::index_entries(config, plan)
        .into_iter()
        .map(|entry| match entry {
            IndexEntry::Heading { title } => {
                let page = separators.next().map(ToString::to_string).unwrap_or_default();
                [title, String::new(), page]
            }
            IndexEntry::Document {
                name, date, label, ..
            } => [format!("  {name}"), date, label.to_string()],
        })
        .collect()
}
