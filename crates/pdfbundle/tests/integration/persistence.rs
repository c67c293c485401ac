//! Exported configurations rebuild the same bundle.

use pdfbundle::bundle::BundleBuilder;
use pdfbundle::config::{BundleConfig, DateFormat};
use pdfbundle::io::{export_config, import_config, load_config_file, save_config_file};
use tempfile::TempDir;

use crate::common::{document, footers, page_showing, uncompressed};

fn config() -> BundleConfig {
    let mut config = BundleConfig::for_case("CV-7", "Smith v Jones", "County Court");
    config.date_format = DateFormat::Iso;
    let main = config.add_section("Statements");
    main.push_document(document("Witness", 2));
    main.push_document(document("Exhibit", 1).late_addition("B"));
    config
}

#[tokio::test]
async fn test_imported_config_builds_identically() {
    let original = config();
    let json = export_config(&original).unwrap();
    let imported = import_config(&json).unwrap();

    // Live bytes travel as base64
    let doc = &imported.sections[0].documents[0];
    assert!(doc.file.is_none());
    assert!(doc.base64_data.is_some());

    let before = BundleBuilder::with_options(uncompressed())
        .build(&original)
        .await
        .unwrap();
    let after = BundleBuilder::with_options(uncompressed())
        .build(&imported)
        .await
        .unwrap();

    assert_eq!(before.statistics.total_pages, after.statistics.total_pages);
    assert_eq!(footers(&before.document), footers(&after.document));
    assert_eq!(page_showing(&after.document, "2024-03-07"), Some(0));
    assert_eq!(page_showing(&after.document, "B1"), Some(0));
}

#[tokio::test]
async fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bundle-config-CV-7.json");
    let original = config();
    assert_eq!(original.export_file_name(), "bundle-config-CV-7.json");

    save_config_file(&original, &path).await.unwrap();
    let loaded = load_config_file(&path).await.unwrap();

    assert_eq!(loaded.case_name, original.case_name);
    assert_eq!(loaded.date_format, DateFormat::Iso);
    assert_eq!(loaded.document_count(), 2);
    assert_eq!(loaded.sections[0].documents[1].late_prefix, "B");

    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&loaded)
        .await
        .unwrap();
    assert_eq!(bundle.statistics.documents_imported, 2);
}
