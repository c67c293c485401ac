//! Index pagination across multiple pages.

use pdfbundle::bundle::{BundleBuilder, BundlePlan};
use pdfbundle::config::BundleConfig;
use rstest::rstest;

use crate::common::{document, footers, link_targets, missing_document, page_ids, page_showing, uncompressed};

fn config_with_documents(count: usize, list_start_y: f32) -> BundleConfig {
    let mut config = BundleConfig::for_case("1", "A v B", "Court");
    config.index_layout.list_start_y = list_start_y;
    let main = config.add_section("Main");
    for i in 1..=count {
        main.push_document(missing_document(&format!("Doc {i}"), 1));
    }
    config
}

#[rstest]
#[case(10, 680.0, 1)]
#[case(34, 680.0, 1)]
#[case(35, 680.0, 2)]
#[case(50, 680.0, 2)]
#[case(50, 410.0, 2)]
#[case(60, 410.0, 3)]
#[case(3, 40.0, 2)]
#[tokio::test]
async fn test_rendered_index_pages_match_plan(
    #[case] documents: usize,
    #[case] list_start_y: f32,
    #[case] expected: usize,
) {
    let config = config_with_documents(documents, list_start_y);
    let plan = BundlePlan::estimate(&config).unwrap();
    assert_eq!(plan.index_pages, expected);

    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();
    assert_eq!(bundle.statistics.index_pages, expected);

    // Index pages, then the separator; no document has bytes
    assert_eq!(bundle.statistics.total_pages, expected + 1);
    let footers = footers(&bundle.document);
    assert!(footers[..expected].iter().all(Option::is_none));
    assert_eq!(footers[expected], Some(format!("Page {}", expected + 1)));
}

#[tokio::test]
async fn test_rows_continue_on_next_page_in_order() {
    // 51 entries, 35 fit on the first page
    let config = config_with_documents(50, 680.0);
    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();
    let doc = &bundle.document;

    assert_eq!(page_showing(doc, "MAIN"), Some(0));
    assert_eq!(page_showing(doc, "Doc 34"), Some(0));
    assert_eq!(page_showing(doc, "Doc 35"), Some(1));
    assert_eq!(page_showing(doc, "Doc 50"), Some(1));

    // The title and layout items only appear on the first page
    assert_eq!(page_showing(doc, "INDEX"), Some(0));
    let second = &crate::common::page_texts(doc)[1];
    assert!(!second.contains("(INDEX) Tj"));
    assert!(second.contains("(Document Name) Tj"));
}

#[tokio::test]
async fn test_links_on_continuation_page() {
    let mut config = config_with_documents(40, 680.0);
    config.sections[0].push_document(document("Last", 2));

    let bundle = BundleBuilder::with_options(uncompressed())
        .build(&config)
        .await
        .unwrap();
    let doc = &bundle.document;
    let pages = page_ids(doc);

    assert_eq!(bundle.plan.index_pages, 2);
    assert!(link_targets(doc, pages[0]).is_empty());

    let targets = link_targets(doc, pages[1]);
    assert_eq!(targets, vec![pages[page_showing(doc, "Last p1").unwrap()]]);
}
