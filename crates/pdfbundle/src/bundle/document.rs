//! The growing output document.
//!
//! [`OutputDocument`] owns a flat page tree that generated pages and imported
//! source pages are appended to in order. Imported pages are detached from
//! their source: inherited attributes are copied onto each page and every
//! object they reach is moved into the output, so the source document can be
//! dropped as soon as its pages are imported.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::bundle::text::{FontStyle, TextRun, encode_runs};
use crate::error::{BundleError, Result};
use crate::pagination::{PAGE_HEIGHT, PAGE_WIDTH, PageLabel};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Deepest page tree walked when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Distance of the footer from the right edge of the page.
const FOOTER_RIGHT_INSET: f32 = 80.0;

/// Footer baseline above the bottom edge of the page.
const FOOTER_Y: f32 = 30.0;

/// Footer font size.
const FOOTER_SIZE: f32 = 10.0;

/// Output document under construction.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    regular_font: ObjectId,
    bold_font: ObjectId,
    page_count: usize,
}

impl OutputDocument {
    /// Create an empty document with a catalog, a page tree and the two
    /// standard fonts used on generated pages.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let regular_font = doc.add_object(FontStyle::Regular.font_dictionary());
        let bold_font = doc.add_object(FontStyle::Bold.font_dictionary());

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            regular_font,
            bold_font,
            page_count: 0,
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Borrow the underlying document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Finish building and hand over the document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Append a blank A4 page carrying `runs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be encoded or the page tree is
    /// damaged.
    pub fn add_page(&mut self, runs: &[TextRun]) -> Result<ObjectId> {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), encode_runs(runs)?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => dictionary! {
                "Font" => self.font_resources(),
            },
            "Contents" => content_id,
        });

        self.append_kids(&[page_id])?;
        Ok(page_id)
    }

    /// Move every page of `source` to the end of this document.
    ///
    /// Returns the new page ids in source page order.
    ///
    /// # Errors
    ///
    /// Returns an error if a page object is not a dictionary or the page tree
    /// is damaged.
    pub fn import_pages(&mut self, mut source: Document) -> Result<Vec<ObjectId>> {
        source.renumber_objects_with(self.doc.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

        for &page_id in &page_ids {
            let inherited = inherited_attributes(&source, page_id);
            let page = source.get_dictionary_mut(page_id).map_err(|e| {
                BundleError::generation_failed(format!("Source page {page_id:?} is unreadable: {e}"))
            })?;

            for (key, value) in inherited {
                if !page.has(key.as_bytes()) {
                    page.set(key, value);
                }
            }
            page.set("Parent", self.pages_id);
        }

        self.doc.max_id = self.doc.max_id.max(source.max_id);

        for (id, object) in source.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    self.doc.objects.insert(id, object);
                }
            }
        }

        self.append_kids(&page_ids)?;
        Ok(page_ids)
    }

    /// Draw `label` as a footer over the existing content of `page_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be read or its text encoded.
    pub fn stamp_footer(&mut self, page_id: ObjectId, label: &PageLabel) -> Result<()> {
        let [_, lly, urx, _] = self.media_box(page_id);
        let run = TextRun::regular(
            label.footer_text(),
            urx - FOOTER_RIGHT_INSET,
            lly + FOOTER_Y,
            FOOTER_SIZE,
        );
        self.stamp(page_id, &[run])
    }

    /// Draw `runs` over the existing content of `page_id`.
    ///
    /// The existing content is wrapped in a saved graphics state so whatever
    /// transform or colour it leaves behind cannot displace the new text.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be read or the text encoded.
    pub fn stamp(&mut self, page_id: ObjectId, runs: &[TextRun]) -> Result<()> {
        let mut overlay = b"Q\n".to_vec();
        overlay.extend(encode_runs(runs)?);

        let save_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = self.doc.add_object(Stream::new(Dictionary::new(), overlay));

        let page = self.page_dictionary(page_id)?.clone();

        let mut resources = page
            .get(b"Resources")
            .map(|obj| self.resolve_dictionary(obj))
            .unwrap_or_else(|_| Dictionary::new());
        let mut fonts = resources
            .get(b"Font")
            .map(|obj| self.resolve_dictionary(obj))
            .unwrap_or_else(|_| Dictionary::new());
        fonts.set(FontStyle::Regular.resource_name(), self.regular_font);
        fonts.set(FontStyle::Bold.resource_name(), self.bold_font);
        resources.set("Font", fonts);

        let mut contents = vec![Object::Reference(save_id)];
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
                _ => contents.push(Object::Reference(*id)),
            },
            Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
            _ => {}
        }
        contents.push(Object::Reference(overlay_id));

        let page = self.page_dictionary_mut(page_id)?;
        page.set("Resources", resources);
        page.set("Contents", contents);
        Ok(())
    }

    /// Attach a link annotation over `rect` on `page_id` that jumps to
    /// `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_id` is not a page dictionary.
    pub fn add_link(&mut self, page_id: ObjectId, rect: [f32; 4], target: ObjectId) -> Result<()> {
        let annotation_id = self.doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect.iter().map(|&v| Object::from(v)).collect::<Vec<_>>(),
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "Dest" => vec![Object::Reference(target), "Fit".into()],
        });

        let page = self.page_dictionary_mut(page_id)?;
        let mut annotations = match page.get(b"Annots") {
            Ok(Object::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        annotations.push(Object::Reference(annotation_id));
        page.set("Annots", annotations);
        Ok(())
    }

    /// The page's MediaBox, A4 if it has none.
    pub fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        let values: Option<Vec<f32>> = self
            .doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"MediaBox"))
            .ok()
            .map(|obj| self.resolve(obj))
            .and_then(|obj| obj.as_array().ok())
            .map(|arr| arr.iter().filter_map(|v| v.as_float().ok()).collect());

        match values.as_deref() {
            Some(&[a, b, c, d]) => [a, b, c, d],
            _ => [0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT],
        }
    }

    fn font_resources(&self) -> Dictionary {
        dictionary! {
            FontStyle::Regular.resource_name() => self.regular_font,
            FontStyle::Bold.resource_name() => self.bold_font,
        }
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn resolve_dictionary(&self, obj: &Object) -> Dictionary {
        self.resolve(obj)
            .as_dict()
            .cloned()
            .unwrap_or_else(|_| Dictionary::new())
    }

    fn page_dictionary(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.doc
            .get_dictionary(page_id)
            .map_err(|e| BundleError::generation_failed(format!("Page {page_id:?} is unreadable: {e}")))
    }

    fn page_dictionary_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.doc
            .get_dictionary_mut(page_id)
            .map_err(|e| BundleError::generation_failed(format!("Page {page_id:?} is unreadable: {e}")))
    }

    /// Add pages to the end of the page tree.
    fn append_kids(&mut self, page_ids: &[ObjectId]) -> Result<()> {
        let pages = self
            .doc
            .get_dictionary_mut(self.pages_id)
            .map_err(|e| BundleError::generation_failed(format!("Failed to get pages object: {e}")))?;

        let kids = pages
            .get_mut(b"Kids")
            .map_err(|_| BundleError::generation_failed("Pages dictionary missing Kids array"))?;

        if let Object::Array(kids_array) = kids {
            kids_array.extend(page_ids.iter().map(|&id| Object::Reference(id)));
        } else {
            return Err(BundleError::generation_failed("Kids is not an array"));
        }

        self.page_count += page_ids.len();
        pages.set("Count", self.page_count as i64);
        Ok(())
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Attributes `page_id` inherits from its ancestors, nearest ancestor first.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(&'static str, Object)> {
    let mut found: Vec<(&'static str, Object)> = Vec::new();
    let mut current = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Parent"))
        .and_then(Object::as_reference)
        .ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node_id) = current else {
            break;
        };
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        for key in INHERITABLE {
            if found.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if let Ok(value) = node.get(key.as_bytes()) {
                found.push((key, value.clone()));
            }
        }

        current = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pdf_with_pages;

    fn page_text(doc: &Document, page_id: ObjectId) -> String {
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn test_new_document_is_empty() {
        let output = OutputDocument::new();
        assert_eq!(output.page_count(), 0);
        assert!(output.document().get_pages().is_empty());
    }

    #[test]
    fn test_add_page() {
        let mut output = OutputDocument::new();
        let page_id = output
            .add_page(&[TextRun::bold("INDEX", 270.0, 790.0, 16.0)])
            .unwrap();

        assert_eq!(output.page_count(), 1);
        assert_eq!(output.media_box(page_id), [0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT]);

        let doc = output.into_document();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(page_text(&doc, page_id).contains("(INDEX) Tj"));
    }

    #[test]
    fn test_import_pages_keeps_order_and_inherited_resources() {
        let mut output = OutputDocument::new();
        output.add_page(&[]).unwrap();

        let source = Document::load_mem(&pdf_with_pages(3)).unwrap();
        let imported = output.import_pages(source).unwrap();
        assert_eq!(imported.len(), 3);
        assert_eq!(output.page_count(), 4);

        let doc = output.document();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        assert_eq!(&pages[1..], imported.as_slice());

        for (i, &page_id) in imported.iter().enumerate() {
            let page = doc.get_dictionary(page_id).unwrap();
            assert!(page.has(b"Resources"));
            assert!(page.has(b"MediaBox"));
            assert!(page_text(doc, page_id).contains(&format!("Source page {}", i + 1)));
        }
    }

    #[test]
    fn test_import_two_sources_without_collisions() {
        let mut output = OutputDocument::new();
        let first = output
            .import_pages(Document::load_mem(&pdf_with_pages(2)).unwrap())
            .unwrap();
        let second = output
            .import_pages(Document::load_mem(&pdf_with_pages(2)).unwrap())
            .unwrap();

        assert!(first.iter().all(|id| !second.contains(id)));
        assert_eq!(output.document().get_pages().len(), 4);
    }

    #[test]
    fn test_stamp_footer_wraps_existing_content() {
        let mut output = OutputDocument::new();
        let imported = output
            .import_pages(Document::load_mem(&pdf_with_pages(1)).unwrap())
            .unwrap();
        output
            .stamp_footer(imported[0], &PageLabel::Number(3))
            .unwrap();

        let doc = output.document();
        let content = page_text(doc, imported[0]);
        assert!(content.starts_with("q"));
        assert!(content.contains("Source page 1"));
        assert!(content.contains("(Page 3) Tj"));

        let page = doc.get_dictionary(imported[0]).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"BndF1"));
    }

    #[test]
    fn test_add_link() {
        let mut output = OutputDocument::new();
        let index = output.add_page(&[]).unwrap();
        let target = output.add_page(&[]).unwrap();

        output.add_link(index, [50.0, 600.0, 545.28, 618.0], target).unwrap();
        output.add_link(index, [50.0, 582.0, 545.28, 600.0], target).unwrap();

        let doc = output.document();
        let annots = doc
            .get_dictionary(index)
            .unwrap()
            .get(b"Annots")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(annots.len(), 2);

        let link = doc
            .get_dictionary(annots[0].as_reference().unwrap())
            .unwrap();
        let dest = link.get(b"Dest").unwrap().as_array().unwrap();
        assert_eq!(dest[0].as_reference().unwrap(), target);
    }
}
