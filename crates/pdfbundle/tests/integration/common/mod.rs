//! Shared helpers for the integration tests.
//!
//! Source PDFs are generated in memory; each page shows a marker such as
//! `Claim p2` so tests can find where a source page ended up.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use pdfbundle::config::{BuildOptions, BundleDocument, CompressionLevel};

/// A PDF with `pages` letter-size pages, each showing `<tag> p<n>`.
pub fn source_pdf(tag: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 14.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("{tag} p{n}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A document named `name` backed by a generated source PDF.
pub fn document(name: &str, pages: usize) -> BundleDocument {
    let mut doc = BundleDocument::new(name, pages, source_pdf(name, pages));
    doc.date = "2024-03-07".to_string();
    doc
}

/// A document with no source bytes.
pub fn missing_document(name: &str, pages: usize) -> BundleDocument {
    let mut doc = document(name, pages);
    doc.file = None;
    doc
}

/// Build options that leave content streams readable.
pub fn uncompressed() -> BuildOptions {
    BuildOptions {
        compression: CompressionLevel::None,
        ..Default::default()
    }
}

/// Page ids in bundle order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Decoded content of every page, in bundle order.
pub fn page_texts(doc: &Document) -> Vec<String> {
    page_ids(doc)
        .into_iter()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

/// Index of the page whose content shows `needle` as a text operand.
pub fn page_showing(doc: &Document, needle: &str) -> Option<usize> {
    let operand = format!("({needle}) Tj");
    page_texts(doc).iter().position(|text| text.contains(&operand))
}

/// Footer text stamped on each page, `None` for pages without one.
pub fn footers(doc: &Document) -> Vec<Option<String>> {
    page_texts(doc)
        .iter()
        .map(|text| {
            let start = text.rfind("(Page ")? + 1;
            let end = text[start..].find(')')? + start;
            Some(text[start..end].to_string())
        })
        .collect()
}

/// Destinations of the link annotations on `page_id`.
pub fn link_targets(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Ok(annots) = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Annots"))
        .and_then(Object::as_array)
    else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot| {
            let link = doc.get_dictionary(annot.as_reference().ok()?).ok()?;
            link.get(b"Dest").ok()?.as_array().ok()?.first()?.as_reference().ok()
        })
        .collect()
}
