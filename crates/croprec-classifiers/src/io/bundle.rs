//! Versioned on-disk bundle for a `FittedModel`.
//!
//! The classifier, scaler and label encoder are only ever written and read
//! together, inside one bincode-encoded `ModelBundle`.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data_handling::FEATURE_NAMES;
use crate::error::PredictorError;
use crate::predictor::FittedModel;

const BUNDLE_MAGIC: [u8; 8] = *b"CROPREC\0";

/// Bumped whenever the serialized layout of `FittedModel` changes.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

const MAX_BUNDLE_BYTES: u64 = 1 << 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    magic: [u8; 8],
    pub format_version: u32,
    /// Version of the crate that wrote the bundle
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub model: FittedModel,
}

impl ModelBundle {
    pub fn new(model: FittedModel) -> Self {
        ModelBundle {
            magic: BUNDLE_MAGIC,
            format_version: BUNDLE_FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            model,
        }
    }

    fn check(&self, path: &Path) -> Result<(), PredictorError> {
        if self.magic != BUNDLE_MAGIC {
            return Err(PredictorError::model_file(path, "not a crop model bundle"));
        }
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(PredictorError::model_file(
                path,
                format!(
                    "unsupported bundle format version {} (expected {})",
                    self.format_version, BUNDLE_FORMAT_VERSION
                ),
            ));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(PredictorError::model_file(
                path,
                format!("unexpected feature columns {:?}", self.feature_names),
            ));
        }
        Ok(())
    }
}

fn bundle_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_BUNDLE_BYTES)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Serialize `model` to `path`.
///
/// The bundle is written to a temporary sibling file and then renamed over
/// `path`, so readers see either the old bundle or the new one.
pub fn save_bundle<P: AsRef<Path>>(model: &FittedModel, path: P) -> Result<(), PredictorError> {
    let path = path.as_ref();
    let bundle = ModelBundle::new(model.clone());
    let bytes = bundle_options()
        .serialize(&bundle)
        .map_err(|e| PredictorError::model_file(path, e))?;

    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    log::info!(
        "Saved model bundle ({} bytes, {} classes) to {}",
        bytes.len(),
        model.classes().len(),
        path.display()
    );
    Ok(())
}

/// Read and validate a bundle from `path`.
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<ModelBundle, PredictorError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| PredictorError::model_file(path, e))?;
    let bundle: ModelBundle = bundle_options()
        .deserialize(&bytes)
        .map_err(|e| PredictorError::model_file(path, e))?;
    bundle.check(path)?;
    bundle
        .model
        .check_consistency()
        .map_err(|reason| PredictorError::model_file(path, reason))?;

    log::debug!(
        "Loaded model bundle v{} written by croprec {} at {}",
        bundle.format_version,
        bundle.crate_version,
        bundle.created_at.to_rfc3339()
    );
    Ok(bundle)
}
