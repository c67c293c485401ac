//! Integration tests for error handling and edge cases.

use pdfbundle::bundle::BundleBuilder;
use pdfbundle::config::{BuildOptions, BundleConfig, BundleDocument};
use pdfbundle::error::BundleError;
use pdfbundle::io::{probe_all, probe_file};
use pdfbundle::validation::Validator;
use tempfile::TempDir;

use crate::common::{document, footers, source_pdf, uncompressed};

#[tokio::test]
async fn test_malformed_source_fails_build() {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    let main = config.add_section("Main");
    main.push_document(document("Good", 1));
    main.push_document(BundleDocument::new("Broken", 2, b"%PDF-1.4 garbage".to_vec()));

    let err = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .err()
        .expect("build should fail");

    match err {
        BundleError::MalformedSource { document, .. } => assert_eq!(document, "Broken"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_page_count_mismatch_fails_by_default() {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    config
        .add_section("Main")
        .push_document(BundleDocument::new("Claim", 3, source_pdf("Claim", 2)));

    let err = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .err()
        .expect("build should fail");

    assert!(matches!(
        err,
        BundleError::PageCountMismatch {
            expected: 3,
            actual: 2,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_page_count_mismatch_permissive() {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    let main = config.add_section("Main");
    main.push_document(BundleDocument::new("Claim", 3, source_pdf("Claim", 2)));
    main.push_document(document("Defence", 1));

    let bundle = BundleBuilder::with_options(BuildOptions {
        verify_page_counts: false,
        ..uncompressed()
    })
    .build(&config)
    .await
    .unwrap();

    // Pages as found: the Defence footer follows the two real Claim pages
    let footers = footers(&bundle.document);
    assert_eq!(footers.last().unwrap().as_deref(), Some("Page 5"));
    assert_eq!(bundle.statistics.body_pages, 3);
}

#[tokio::test]
async fn test_strict_validation_rejects_warnings() {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    let mut doc = document("Claim", 1);
    doc.date = "March 2024".to_string();
    config.add_section("Main").push_document(doc);

    assert!(Validator::new().validate_config(&config).is_ok());
    let err = Validator::strict().validate_config(&config).unwrap_err();
    assert!(matches!(err, BundleError::InvalidConfig { .. }));
}

#[tokio::test]
async fn test_probe_files() {
    let temp_dir = TempDir::new().unwrap();
    let good = temp_dir.path().join("Claim.pdf");
    let bad = temp_dir.path().join("notes.pdf");
    std::fs::write(&good, source_pdf("Claim", 4)).unwrap();
    std::fs::write(&bad, b"plain text").unwrap();
    let missing = temp_dir.path().join("missing.pdf");

    let probed = probe_file(&good).await.unwrap();
    assert_eq!(probed.page_count, 4);
    let doc = probed.into_document();
    assert_eq!(doc.name, "Claim");
    assert_eq!(doc.original_name, "Claim.pdf");

    let results = probe_all(&[good, bad, missing, temp_dir.path().to_path_buf()], 2).await;
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(BundleError::MalformedSource { .. })));
    assert!(matches!(results[2], Err(BundleError::FileNotFound { .. })));
    assert!(matches!(results[3], Err(BundleError::NotAFile { .. })));
}
