//! Bundle configuration model.
//!
//! This module defines the data the bundle pipeline consumes: case metadata,
//! ordered sections of documents, the index page layout and the build
//! options. It also carries the small editing operations a front end uses to
//! arrange documents before a build:
//! - Adding, removing and looking up sections
//! - Reordering documents within a section
//! - Creating a document from an uploaded file
//!
//! All types serialize to the camelCase JSON form used by exported
//! configurations (see [`crate::io::persist`]).

use std::borrow::Cow;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result};

/// Title given to the section of a freshly created configuration.
pub const DEFAULT_SECTION_TITLE: &str = "Main Documents";

/// Prefix given to late additions unless the user picks another.
pub const DEFAULT_LATE_PREFIX: &str = "A";

/// Default Y coordinate of the index column header row.
pub const DEFAULT_LIST_START_Y: f32 = 680.0;

/// Display form for document dates in the index.
///
/// Stored dates are always `YYYY-MM-DD`; this only selects how they are
/// rearranged when printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// Day first: `07-03-2024`.
    #[default]
    #[serde(rename = "DD-MM-YYYY")]
    DayMonthYear,
    /// Month first: `03-07-2024`.
    #[serde(rename = "MM-DD-YYYY")]
    MonthDayYear,
    /// Unchanged ISO form: `2024-03-07`.
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
}

impl DateFormat {
    /// The literal pattern this format renders as.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayMonthYear => "DD-MM-YYYY",
            Self::MonthDayYear => "MM-DD-YYYY",
            Self::Iso => "YYYY-MM-DD",
        }
    }
}

impl FromStr for DateFormat {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DD-MM-YYYY" => Ok(Self::DayMonthYear),
            "MM-DD-YYYY" => Ok(Self::MonthDayYear),
            "YYYY-MM-DD" => Ok(Self::Iso),
            _ => Err(BundleError::invalid_config(format!(
                "Invalid date format: {s}. Must be one of: DD-MM-YYYY, MM-DD-YYYY, YYYY-MM-DD"
            ))),
        }
    }
}

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression - content streams are written as produced.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress streams and drop objects no page refers to.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(BundleError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// What to do when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before replacing.
    #[default]
    Prompt,
    /// Replace without asking.
    Force,
    /// Never replace.
    NoClobber,
}

/// A free-form text item drawn on the first index page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Stable identifier of the item.
    pub id: String,
    /// Text to draw. `{caseName}`, `{caseNumber}` and `{courtName}` are
    /// replaced with the configuration's case metadata.
    pub text: String,
    /// X position in PDF points, origin bottom-left.
    pub x: f32,
    /// Y position in PDF points, origin bottom-left.
    pub y: f32,
}

impl LayoutItem {
    /// Create a layout item.
    pub fn new(id: impl Into<String>, text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            x,
            y,
        }
    }

    /// Resolve placeholders against the case metadata of `config`.
    pub fn resolve_text(&self, config: &BundleConfig) -> String {
        self.text
            .replace("{caseName}", &config.case_name)
            .replace("{caseNumber}", &config.case_number)
            .replace("{courtName}", &config.court_name)
    }
}

/// Placement of the first index page's content.
///
/// Older exports stored only the positions of the three case items, as
/// `{caseName: {x, y}, caseNumber: {x, y}, courtName: {x, y}}`. Those read
/// back as the default items at the stored coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredLayout")]
pub struct IndexLayout {
    /// Positioned text items (case name, number, court, ...).
    pub items: Vec<LayoutItem>,
    /// Y coordinate of the column header row on the first index page.
    /// Document rows are listed below it.
    pub list_start_y: f32,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            items: vec![
                LayoutItem::new("caseName", "Case: {caseName}", 50.0, 760.0),
                LayoutItem::new("caseNumber", "Case No: {caseNumber}", 50.0, 745.0),
                LayoutItem::new("courtName", "Court: {courtName}", 50.0, 730.0),
            ],
            list_start_y: DEFAULT_LIST_START_Y,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLayout {
    Items(ItemLayout),
    Positions(PositionLayout),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemLayout {
    items: Vec<LayoutItem>,
    list_start_y: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionLayout {
    case_name: Position,
    case_number: Position,
    court_name: Position,
}

#[derive(Deserialize)]
struct Position {
    x: f32,
    y: f32,
}

impl From<StoredLayout> for IndexLayout {
    fn from(stored: StoredLayout) -> Self {
        match stored {
            StoredLayout::Items(layout) => Self {
                items: layout.items,
                list_start_y: layout.list_start_y,
            },
            StoredLayout::Positions(positions) => {
                let mut layout = Self::default();
                for item in &mut layout.items {
                    let position = match item.id.as_str() {
                        "caseName" => &positions.case_name,
                        "caseNumber" => &positions.case_number,
                        "courtName" => &positions.court_name,
                        _ => continue,
                    };
                    item.x = position.x;
                    item.y = position.y;
                }
                layout
            }
        }
    }
}

/// A source document placed in a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDocument {
    /// Identifier of the document.
    pub id: String,
    /// Name shown in the index.
    pub name: String,
    /// Filename the document was uploaded as.
    #[serde(default)]
    pub original_name: String,
    /// Document date, canonically `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// Number of pages, probed once at intake.
    pub page_count: usize,
    /// Whether the document is numbered with its own prefixed labels.
    #[serde(default)]
    pub is_late_addition: bool,
    /// Prefix used for late-addition labels (`A1`, `A2`, ...).
    #[serde(default = "default_late_prefix")]
    pub late_prefix: String,
    /// Whether the user asked for OCR. Carried through, never acted on here.
    #[serde(default)]
    pub ocr: bool,
    /// Live bytes of the uploaded file. Never serialized.
    #[serde(skip)]
    pub file: Option<Vec<u8>>,
    /// Base64 form of the bytes, present in exported configurations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_data: Option<String>,
}

fn default_late_prefix() -> String {
    DEFAULT_LATE_PREFIX.to_string()
}

impl BundleDocument {
    /// Create a document from live bytes and an already known page count.
    pub fn new(name: impl Into<String>, page_count: usize, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            id: generate_id(),
            original_name: format!("{name}.pdf"),
            name,
            date: today(),
            page_count,
            is_late_addition: false,
            late_prefix: default_late_prefix(),
            ocr: false,
            file: Some(bytes),
            base64_data: None,
        }
    }

    /// Create a document from an uploaded file.
    ///
    /// The page count is probed from `bytes`, the display name is the file
    /// name without its `.pdf` extension and the date defaults to today.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::MalformedSource`] if `bytes` is not a PDF.
    pub fn from_upload(file_name: &str, bytes: Vec<u8>) -> Result<Self> {
        let page_count =
            crate::io::probe_page_count(&bytes).map_err(|e| e.for_document(file_name))?;

        let name = strip_pdf_extension(file_name);
        let mut doc = Self::new(name, page_count, bytes);
        doc.original_name = file_name.to_string();
        Ok(doc)
    }

    /// Mark this document as a late addition numbered with `prefix`.
    pub fn late_addition(mut self, prefix: impl Into<String>) -> Self {
        self.is_late_addition = true;
        self.late_prefix = prefix.into();
        self
    }

    /// The document's bytes, preferring the live handle over the encoded form.
    ///
    /// Returns `None` when neither is present or the encoded form does not
    /// decode.
    pub fn source_bytes(&self) -> Option<Cow<'_, [u8]>> {
        if let Some(ref file) = self.file {
            return Some(Cow::Borrowed(file.as_slice()));
        }

        let encoded = self.base64_data.as_deref()?;
        match BASE64.decode(encoded) {
            Ok(bytes) => Some(Cow::Owned(bytes)),
            Err(e) => {
                tracing::warn!(document = %self.name, error = %e, "stored document data is not valid base64");
                None
            }
        }
    }

    /// Whether any source bytes are attached.
    pub fn has_source(&self) -> bool {
        self.file.is_some() || self.base64_data.is_some()
    }
}

/// Direction for moving a document within its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the section.
    Up,
    /// Towards the end of the section.
    Down,
}

/// A titled, ordered group of documents with its own separator page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Identifier of the section.
    pub id: String,
    /// Title printed on the separator page and as an index heading.
    pub title: String,
    /// Documents in bundle order.
    #[serde(default)]
    pub documents: Vec<BundleDocument>,
}

impl Section {
    /// Create an empty section.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            documents: Vec::new(),
        }
    }

    /// Append a document to the end of the section.
    pub fn push_document(&mut self, document: BundleDocument) {
        self.documents.push(document);
    }

    /// Remove a document by id. Returns whether one was removed.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }

    /// Swap a document with its neighbour. No-op at either end.
    ///
    /// Returns whether the order changed.
    pub fn move_document(&mut self, id: &str, direction: Direction) -> bool {
        let Some(index) = self.documents.iter().position(|d| d.id == id) else {
            return false;
        };

        match direction {
            Direction::Up if index > 0 => {
                self.documents.swap(index - 1, index);
                true
            }
            Direction::Down if index + 1 < self.documents.len() => {
                self.documents.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// Order documents by their ISO date, oldest first. Ties keep their order.
    pub fn sort_by_date(&mut self) {
        self.documents.sort_by(|a, b| a.date.cmp(&b.date));
    }

    /// Sum of the recorded page counts of all documents.
    pub fn declared_pages(&self) -> usize {
        self.documents.iter().map(|d| d.page_count).sum()
    }
}

/// Everything needed to build a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    /// Court case number.
    #[serde(default)]
    pub case_number: String,
    /// Court case name.
    #[serde(default)]
    pub case_name: String,
    /// Name of the court.
    #[serde(default)]
    pub court_name: String,
    /// How document dates are displayed in the index.
    #[serde(default)]
    pub date_format: DateFormat,
    /// Sections in bundle order.
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Layout of the first index page.
    #[serde(default)]
    pub index_layout: IndexLayout,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            case_number: String::new(),
            case_name: String::new(),
            court_name: String::new(),
            date_format: DateFormat::default(),
            sections: vec![Section::new(DEFAULT_SECTION_TITLE)],
            index_layout: IndexLayout::default(),
        }
    }
}

impl BundleConfig {
    /// Create a configuration with case metadata and no sections.
    pub fn for_case(
        case_number: impl Into<String>,
        case_name: impl Into<String>,
        court_name: impl Into<String>,
    ) -> Self {
        Self {
            case_number: case_number.into(),
            case_name: case_name.into(),
            court_name: court_name.into(),
            sections: Vec::new(),
            ..Default::default()
        }
    }

    /// Append a new empty section and return it for filling.
    pub fn add_section(&mut self, title: impl Into<String>) -> &mut Section {
        self.sections.push(Section::new(title));
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// Remove a section by id. Returns whether one was removed.
    pub fn remove_section(&mut self, id: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.id != id);
        self.sections.len() != before
    }

    /// Look up a section by id.
    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Iterate over every document in bundle order.
    pub fn documents(&self) -> impl Iterator<Item = &BundleDocument> {
        self.sections.iter().flat_map(|s| s.documents.iter())
    }

    /// Number of documents across all sections.
    pub fn document_count(&self) -> usize {
        self.sections.iter().map(|s| s.documents.len()).sum()
    }

    /// Suggested file name for the generated bundle.
    pub fn bundle_file_name(&self) -> String {
        format!("Bundle-{}.pdf", non_empty_or(&self.case_number, "Output"))
    }

    /// Suggested file name for an exported configuration.
    pub fn export_file_name(&self) -> String {
        format!(
            "bundle-config-{}.json",
            non_empty_or(&self.case_number, "export")
        )
    }
}

/// Options controlling a bundle build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Attach clickable links from index rows to document first pages.
    pub links: bool,
    /// Fail when a document's recorded page count disagrees with its bytes.
    pub verify_page_counts: bool,
    /// Compression applied to the finished document.
    pub compression: CompressionLevel,
    /// Write title, subject and keywords from the case metadata.
    pub metadata: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            links: true,
            verify_page_counts: true,
            compression: CompressionLevel::Standard,
            metadata: true,
        }
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim()
    }
}

pub(crate) fn strip_pdf_extension(file_name: &str) -> &str {
    let len = file_name.len();
    if len > 4 && file_name.is_char_boundary(len - 4) && file_name[len - 4..].eq_ignore_ascii_case(".pdf")
    {
        &file_name[..len - 4]
    } else {
        file_name
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Generate a short random identifier for sections and documents.
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
