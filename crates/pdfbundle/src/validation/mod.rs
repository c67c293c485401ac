//! Configuration validation.
//!
//! Checks a bundle configuration before it is built and reports anything that
//! would produce a surprising bundle:
//! - Documents without source bytes (skipped at assembly)
//! - Dates that are not `YYYY-MM-DD` (printed unchanged in the index)
//! - Late additions without a prefix
//! - A list start leaving no rows on the first index page
//! - Layout items placed off the page
//! - Duplicate document identifiers
//!
//! In strict mode any of these fails validation.
//!
//! # Examples
//!
//! ```
//! use pdfbundle::config::BundleConfig;
//! use pdfbundle::validation::Validator;
//!
//! let config = BundleConfig::default();
//! let summary = Validator::new().validate_config(&config).unwrap();
//! assert_eq!(summary.sections, 1);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::bundle::BundlePlan;
use crate::config::{BundleConfig, OverwriteMode};
use crate::error::{BundleError, Result};
use crate::pagination::{PAGE_HEIGHT, PAGE_WIDTH, first_page_capacity};

/// A problem found in a configuration that does not stop a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationWarning {
    /// Document has neither live bytes nor decodable encoded bytes.
    MissingSource {
        /// Document name.
        document: String,
    },
    /// Document date is not a valid `YYYY-MM-DD` date.
    NonIsoDate {
        /// Document name.
        document: String,
        /// The stored date.
        date: String,
    },
    /// Late addition with an empty prefix.
    MissingLatePrefix {
        /// Document name.
        document: String,
    },
    /// No index row fits on the first index page.
    NoFirstPageRows {
        /// The configured list start.
        list_start_y: f32,
    },
    /// Layout item outside the page.
    LayoutItemOffCanvas {
        /// Layout item id.
        item: String,
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },
    /// Two documents share an id.
    DuplicateDocumentId {
        /// The repeated id.
        id: String,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource { document } => {
                write!(f, "Document '{document}' has no source file and will be skipped")
            }
            Self::NonIsoDate { document, date } => {
                write!(f, "Document '{document}' has date '{date}', expected YYYY-MM-DD")
            }
            Self::MissingLatePrefix { document } => {
                write!(f, "Late addition '{document}' has no page prefix")
            }
            Self::NoFirstPageRows { list_start_y } => write!(
                f,
                "List start Y {list_start_y} leaves no rows on the first index page"
            ),
            Self::LayoutItemOffCanvas { item, x, y } => {
                write!(f, "Layout item '{item}' at ({x}, {y}) is outside the page")
            }
            Self::DuplicateDocumentId { id } => write!(f, "Document id '{id}' is used more than once"),
        }
    }
}

/// Summary of a validated configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Number of sections.
    pub sections: usize,
    /// Number of documents across all sections.
    pub documents: usize,
    /// Sum of the documents' recorded page counts.
    pub declared_pages: usize,
    /// Documents without source bytes.
    pub missing_sources: usize,
    /// Everything worth telling the user about.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationSummary {
    /// Whether validation found nothing to report.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validator for bundle configurations and output paths.
pub struct Validator {
    /// Whether warnings fail validation.
    strict: bool,
}

impl Validator {
    /// Create a new validator with default settings.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a new validator with strict mode enabled.
    ///
    /// In strict mode, warnings are treated as errors.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::InvalidConfig`] if the page counts cannot be
    /// numbered. In strict mode, also fails listing every warning found.
    pub fn validate_config(&self, config: &BundleConfig) -> Result<ValidationSummary> {
        BundlePlan::estimate(config)?;

        let mut warnings = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut missing_sources = 0;

        for doc in config.documents() {
            if doc.source_bytes().is_none() {
                missing_sources += 1;
                warnings.push(ValidationWarning::MissingSource {
                    document: doc.name.clone(),
                });
            }

            if NaiveDate::parse_from_str(&doc.date, "%Y-%m-%d").is_err() {
                warnings.push(ValidationWarning::NonIsoDate {
                    document: doc.name.clone(),
                    date: doc.date.clone(),
                });
            }

            if doc.is_late_addition && doc.late_prefix.trim().is_empty() {
                warnings.push(ValidationWarning::MissingLatePrefix {
                    document: doc.name.clone(),
                });
            }

            if !seen_ids.insert(doc.id.as_str()) {
                warnings.push(ValidationWarning::DuplicateDocumentId { id: doc.id.clone() });
            }
        }

        let list_start_y = config.index_layout.list_start_y;
        if first_page_capacity(list_start_y) == 0 {
            warnings.push(ValidationWarning::NoFirstPageRows { list_start_y });
        }

        for item in &config.index_layout.items {
            if !on_canvas(item.x, item.y) {
                warnings.push(ValidationWarning::LayoutItemOffCanvas {
                    item: item.id.clone(),
                    x: item.x,
                    y: item.y,
                });
            }
        }

        if self.strict && !warnings.is_empty() {
            let messages: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            return Err(BundleError::invalid_config(messages.join("; ")));
        }

        Ok(ValidationSummary {
            sections: config.sections.len(),
            documents: config.document_count(),
            declared_pages: config.sections.iter().map(|s| s.declared_pages()).sum(),
            missing_sources,
            warnings,
        })
    }

    /// Validate the output path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The output exists and `mode` is [`OverwriteMode::NoClobber`]
    /// - The output's directory does not exist or is read-only
    pub async fn validate_output(&self, path: &Path, mode: OverwriteMode) -> Result<()> {
        if path.exists() && mode == OverwriteMode::NoClobber {
            return Err(BundleError::output_exists(path.to_path_buf()));
        }

        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let metadata = tokio::fs::metadata(parent).await.map_err(|_| {
            BundleError::invalid_config(format!(
                "Output directory does not exist: {}",
                parent.display()
            ))
        })?;

        if metadata.permissions().readonly() {
            return Err(BundleError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

fn on_canvas(x: f32, y: f32) -> bool {
    (0.0..=PAGE_WIDTH).contains(&x) && (0.0..=PAGE_HEIGHT).contains(&y)
}
