//! pdfbundle - Assemble indexed, paginated PDF bundles.
//!
//! A bundle is a single PDF made of ordered sections of source documents,
//! preceded by an index. This library provides:
//!
//! - Index pages listing every section and document with its page label
//! - A separator page per section
//! - Running page-number footers, with independent numbering for late
//!   additions
//! - Clickable links from index rows to each document's first page
//! - Config import/export with embedded documents
//!
//! # Examples
//!
//! ## Building a Bundle
//!
//! ```no_run
//! use pdfbundle::config::{BundleConfig, BundleDocument};
//! use pdfbundle::bundle::BundleBuilder;
//!
//! # async fn example(claim: Vec<u8>, reply: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = BundleConfig::for_case("CV-2024-001", "Smith v Jones", "High Court");
//! let pleadings = config.add_section("Pleadings");
//! pleadings.push_document(BundleDocument::from_upload("Claim.pdf", claim)?);
//! pleadings.push_document(BundleDocument::from_upload("Reply.pdf", reply)?.late_addition("A"));
//!
//! let mut bundle = BundleBuilder::new().build(&config).await?;
//! println!("Created {} page bundle", bundle.statistics.total_pages);
//! let bytes = bundle.to_bytes()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Saving and Loading Configurations
//!
//! ```no_run
//! use pdfbundle::io::{load_config_file, save_config_file};
//! use pdfbundle::validation::Validator;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_file(Path::new("bundle-config.json")).await?;
//! let summary = Validator::new().validate_config(&config)?;
//! println!("{} documents", summary.documents);
//!
//! save_config_file(&config, Path::new("copy.json")).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod io;
pub mod output;
pub mod pagination;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use bundle::{BundleBuilder, build_bundle};
pub use config::BundleConfig;
pub use error::{BundleError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
