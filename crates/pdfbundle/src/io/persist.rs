//! Configuration import and export.
//!
//! Exported configurations are pretty-printed camelCase JSON. Live document
//! bytes never appear in the output; each document carries its bytes as a
//! base64 string under `base64Data` instead, so an exported file is
//! self-contained and can be rebuilt on another machine.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::bundle::BundlePlan;
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};

/// Serialize a configuration with every live document encoded as base64.
///
/// # Errors
///
/// Returns [`BundleError::InvalidConfig`] if serialization fails.
pub fn export_config(config: &BundleConfig) -> Result<String> {
    let mut exported = config.clone();

    for doc in exported.sections.iter_mut().flat_map(|s| s.documents.iter_mut()) {
        if let Some(bytes) = doc.file.take() {
            doc.base64_data = Some(BASE64.encode(bytes));
        }
    }

    Ok(serde_json::to_string_pretty(&exported)?)
}

/// Parse a previously exported configuration.
///
/// Missing `indexLayout` and `dateFormat` fields fall back to their defaults.
/// Documents come back without a live handle; their bytes are decoded from
/// `base64Data` when the bundle is built.
///
/// # Errors
///
/// Returns [`BundleError::InvalidConfig`] if `json` is not a valid
/// configuration or its page counts cannot be numbered.
pub fn import_config(json: &str) -> Result<BundleConfig> {
    let config: BundleConfig = serde_json::from_str(json)
        .map_err(|e| BundleError::invalid_config(format!("Cannot read configuration: {e}")))?;
    BundlePlan::estimate(&config)?;
    Ok(config)
}

/// Read and parse a configuration file.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or not a valid
/// configuration.
pub async fn load_config_file(path: &Path) -> Result<BundleConfig> {
    if !path.exists() {
        return Err(BundleError::file_not_found(path.to_path_buf()));
    }

    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BundleError::FileNotAccessible {
            path: path.to_path_buf(),
            source: e,
        })?;

    let config = import_config(&json)?;
    tracing::debug!(
        path = %path.display(),
        sections = config.sections.len(),
        documents = config.document_count(),
        "loaded configuration"
    );
    Ok(config)
}

/// Export a configuration and write it to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn save_config_file(config: &BundleConfig, path: &Path) -> Result<()> {
    let json = export_config(config)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| BundleError::FailedToWrite {
            path: path.to_path_buf(),
            source: e,
        })
}
