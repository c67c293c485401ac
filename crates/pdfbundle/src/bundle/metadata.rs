//! Document information for the finished bundle.
//!
//! The Info dictionary is filled from the case metadata: the case name
//! becomes the title, the court the subject and the case number the
//! keywords.

use chrono::{DateTime, Local};
use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::config::BundleConfig;

/// Name recorded as creator and producer.
pub const PRODUCER: &str = "pdfbundle";

/// Info dictionary fields of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BundleMetadata {
    /// Document title.
    pub title: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords.
    pub keywords: Option<String>,
}

impl BundleMetadata {
    /// Derive metadata from the case details of `config`. Blank fields are
    /// left out.
    pub fn from_config(config: &BundleConfig) -> Self {
        Self {
            title: non_blank(&config.case_name),
            subject: non_blank(&config.court_name),
            keywords: non_blank(&config.case_number),
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.subject.is_none() && self.keywords.is_none()
    }

    /// Write these fields, creator, producer and timestamps to `doc`'s Info
    /// dictionary, replacing any existing one.
    pub fn apply(&self, doc: &mut Document) {
        let mut info = Dictionary::new();

        let fields = [
            ("Title", &self.title),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text_string(value));
            }
        }

        info.set("Creator", text_string(PRODUCER));
        info.set("Producer", text_string(PRODUCER));

        let date = format_pdf_date(Local::now());
        info.set("CreationDate", text_string(&date));
        info.set("ModDate", text_string(&date));

        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    /// Read the fields back from `doc`.
    pub fn read(doc: &Document) -> Self {
        let Some(info) = doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok()
        else {
            return Self::default();
        };

        Self {
            title: string_field(info, b"Title"),
            subject: string_field(info, b"Subject"),
            keywords: string_field(info, b"Keywords"),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn text_string(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

fn string_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSS+HH'mm'`).
pub fn format_pdf_date(time: DateTime<Local>) -> String {
    let offset = time.format("%z").to_string();
    let (hours, minutes) = offset.split_at(offset.len().min(3));
    format!("{}{hours}'{minutes}'", time.format("D:%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_config_skips_blank_fields() {
        let mut config = BundleConfig::for_case("CV-9", "Smith v Jones", "  ");
        config.case_name = "Smith v Jones".to_string();

        let metadata = BundleMetadata::from_config(&config);
        assert_eq!(metadata.title.as_deref(), Some("Smith v Jones"));
        assert_eq!(metadata.subject, None);
        assert_eq!(metadata.keywords.as_deref(), Some("CV-9"));
        assert!(!metadata.is_empty());
        assert!(BundleMetadata::default().is_empty());
    }

    #[test]
    fn test_apply_and_read() {
        let mut doc = Document::with_version("1.5");
        let metadata = BundleMetadata {
            title: Some("Smith v Jones".to_string()),
            subject: Some("High Court".to_string()),
            keywords: None,
        };

        metadata.apply(&mut doc);
        assert_eq!(BundleMetadata::read(&doc), metadata);

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(string_field(info, b"Producer").as_deref(), Some(PRODUCER));
        assert!(info.has(b"CreationDate"));
    }

    #[test]
    fn test_read_without_info() {
        let doc = Document::with_version("1.5");
        assert!(BundleMetadata::read(&doc).is_empty());
    }

    #[test]
    fn test_format_pdf_date() {
        let time = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        let date = format_pdf_date(time);
        assert!(date.starts_with("D:20240307090501"));
        assert!(date.ends_with('\''));
    }
}
