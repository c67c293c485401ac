//! End-to-end bundle builds.

use lopdf::Document;
use pdfbundle::bundle::{BundleBuilder, BundleMetadata, build_bundle};
use pdfbundle::config::{BuildOptions, BundleConfig, CompressionLevel};
use pdfbundle::io::PdfWriter;
use tempfile::TempDir;

use crate::common::{
    document, footers, link_targets, missing_document, page_ids, page_showing, uncompressed,
};

fn claim_and_reply() -> BundleConfig {
    let mut config = BundleConfig::for_case("CV-2024-001", "Smith v Jones", "High Court");
    let pleadings = config.add_section("Pleadings");
    pleadings.push_document(document("Claim", 3));
    pleadings.push_document(document("Reply", 1).late_addition("A"));
    config
}

#[tokio::test]
async fn test_footers_follow_running_and_late_numbering() {
    let config = claim_and_reply();
    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();

    assert_eq!(
        footers(&bundle.document),
        vec![
            None,
            Some("Page 2".to_string()),
            Some("Page 3".to_string()),
            Some("Page 4".to_string()),
            Some("Page 5".to_string()),
            Some("Page A1".to_string()),
        ]
    );

    // Source content survives in order beneath the footers
    let doc = &bundle.document;
    assert_eq!(page_showing(doc, "Claim p1"), Some(2));
    assert_eq!(page_showing(doc, "Claim p3"), Some(4));
    assert_eq!(page_showing(doc, "Reply p1"), Some(5));
}

#[tokio::test]
async fn test_index_lists_sections_and_labels() {
    let config = claim_and_reply();
    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();
    let doc = &bundle.document;

    for text in ["INDEX", "PLEADINGS", "Claim", "Reply", "3", "A1", "07-03-2024"] {
        assert_eq!(page_showing(doc, text), Some(0), "index should show {text}");
    }
    assert_eq!(page_showing(doc, "Case: Smith v Jones"), Some(0));
    assert_eq!(page_showing(doc, "Court: High Court"), Some(0));

    // Separator title
    let texts = crate::common::page_texts(doc);
    assert!(texts[1].contains("(PLEADINGS) Tj"));
}

#[tokio::test]
async fn test_index_links_target_first_pages() {
    let config = claim_and_reply();
    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();
    let doc = &bundle.document;
    let pages = page_ids(doc);

    let targets = link_targets(doc, pages[0]);
    assert_eq!(targets.len(), 2);

    let claim_page = page_showing(doc, "Page 3").unwrap();
    let reply_page = page_showing(doc, "Page A1").unwrap();
    assert_eq!(targets[0], pages[claim_page]);
    assert_eq!(targets[1], pages[reply_page]);
    assert_eq!(bundle.statistics.links_added, 2);
}

#[tokio::test]
async fn test_empty_sections_still_get_separators() {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    config.add_section("First");
    config.add_section("Second");

    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();

    assert_eq!(bundle.statistics.total_pages, 3);
    assert_eq!(bundle.statistics.separator_pages, 2);
    assert_eq!(
        footers(&bundle.document),
        vec![None, Some("Page 2".to_string()), Some("Page 3".to_string())]
    );
}

#[tokio::test]
async fn test_missing_source_is_skipped_without_link() {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    let main = config.add_section("Main");
    main.push_document(missing_document("Lost", 2));
    main.push_document(document("Kept", 1));

    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();
    let doc = &bundle.document;

    assert_eq!(bundle.statistics.documents_skipped, 1);
    assert_eq!(bundle.statistics.documents_imported, 1);

    // Both rows are listed, only the imported one links
    assert_eq!(page_showing(doc, "Lost"), Some(0));
    let targets = link_targets(doc, page_ids(doc)[0]);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0], page_ids(doc)[page_showing(doc, "Kept p1").unwrap()]);
}

#[tokio::test]
async fn test_build_without_links_or_metadata() {
    let config = claim_and_reply();
    let bundle = BundleBuilder::with_options(BuildOptions {
        links: false,
        metadata: false,
        ..uncompressed()
    })
    .build(&config)
    .await
    .unwrap();

    assert!(link_targets(&bundle.document, page_ids(&bundle.document)[0]).is_empty());
    assert!(BundleMetadata::read(&bundle.document).is_empty());
}

#[tokio::test]
async fn test_written_bundle_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("bundle.pdf");

    let mut bundle = BundleBuilder::with_options(BuildOptions {
        compression: CompressionLevel::Maximum,
        ..Default::default()
    })
    .build(&claim_and_reply())
    .await
    .unwrap();

    let stats = PdfWriter::new()
        .save_bytes(bundle.to_bytes().unwrap(), &output)
        .await
        .unwrap();
    assert!(stats.file_size > 0);

    let reloaded = Document::load(&output).unwrap();
    assert_eq!(reloaded.get_pages().len(), 6);
    assert_eq!(
        BundleMetadata::read(&reloaded).title.as_deref(),
        Some("Smith v Jones")
    );
}

#[tokio::test]
async fn test_build_bundle_defaults() {
    let bytes = build_bundle(&claim_and_reply()).await.unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 6);
}
