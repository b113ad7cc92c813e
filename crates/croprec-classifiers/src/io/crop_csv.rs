//! Crop recommendation table reader (CSV, or TSV by extension).
//!
//! Columns are resolved from the header row by name, never by position, so
//! column order and extra columns in the file do not matter.
use std::path::Path;

use csv::StringRecord;

use crate::data_handling::{Dataset, FeatureVector, TrainingRow, FEATURE_NAMES, N_FEATURES};
use crate::error::PredictorError;

/// Configuration for reading crop tables.
#[derive(Debug, Clone)]
pub struct CropReaderConfig {
    /// Column name holding the crop label.
    pub label_column: String,
    /// Field delimiter. When `None`, `.tsv` files use tabs and everything
    /// else uses commas.
    pub delimiter: Option<u8>,
}

impl Default for CropReaderConfig {
    fn default() -> Self {
        Self {
            label_column: "label".to_string(),
            delimiter: None,
        }
    }
}

impl CropReaderConfig {
    fn delimiter_for(&self, path: &Path) -> u8 {
        self.delimiter.unwrap_or_else(|| {
            let is_tsv = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("tsv"));
            if is_tsv {
                b'\t'
            } else {
                b','
            }
        })
    }
}

/// Read a labelled crop table into a `Dataset`.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, PredictorError> {
    read_dataset_with_config(path, &CropReaderConfig::default())
}

/// Read a labelled crop table using a custom configuration.
pub fn read_dataset_with_config<P: AsRef<Path>>(
    path: P,
    config: &CropReaderConfig,
) -> Result<Dataset, PredictorError> {
    let path = path.as_ref();
    let mut reader = open_reader(path, config)?;
    let headers = reader.headers()?.clone();

    let label_idx = find_column(&headers, &config.label_column).ok_or_else(|| {
        PredictorError::Dataset(format!(
            "Missing label column '{}' in {}",
            config.label_column,
            path.display()
        ))
    })?;
    let feature_indices = resolve_feature_indices(&headers, path)?;

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let features = parse_features(&record, &feature_indices, row_idx)?;

        let label = record.get(label_idx).unwrap_or("").trim();
        if label.is_empty() {
            return Err(PredictorError::Dataset(format!(
                "Missing label value at row {}",
                row_idx + 1
            )));
        }
        rows.push(TrainingRow::new(features, label));
    }

    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(Dataset::new(rows))
}

/// Read unlabelled feature rows, e.g. for batch inference. A label column,
/// if present, is ignored.
pub fn read_feature_vectors<P: AsRef<Path>>(path: P) -> Result<Vec<FeatureVector>, PredictorError> {
    let path = path.as_ref();
    let mut reader = open_reader(path, &CropReaderConfig::default())?;
    let headers = reader.headers()?.clone();
    let feature_indices = resolve_feature_indices(&headers, path)?;

    let mut vectors = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        vectors.push(parse_features(&record, &feature_indices, row_idx)?);
    }
    Ok(vectors)
}

fn open_reader(
    path: &Path,
    config: &CropReaderConfig,
) -> Result<csv::Reader<std::fs::File>, PredictorError> {
    if !path.exists() {
        return Err(PredictorError::Dataset(format!(
            "Dataset file not found: {}",
            path.display()
        )));
    }
    Ok(csv::ReaderBuilder::new()
        .delimiter(config.delimiter_for(path))
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?)
}

/// Exact header match first, then a case-insensitive one.
fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .or_else(|| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(name))
        })
}

fn resolve_feature_indices(
    headers: &StringRecord,
    path: &Path,
) -> Result<[usize; N_FEATURES], PredictorError> {
    let mut indices = [0usize; N_FEATURES];
    for (slot, name) in indices.iter_mut().zip(FEATURE_NAMES) {
        *slot = find_column(headers, name).ok_or_else(|| {
            PredictorError::Dataset(format!(
                "Missing feature column '{}' in {}",
                name,
                path.display()
            ))
        })?;
    }
    Ok(indices)
}

fn parse_features(
    record: &StringRecord,
    feature_indices: &[usize; N_FEATURES],
    row_idx: usize,
) -> Result<FeatureVector, PredictorError> {
    let mut values = [0.0f64; N_FEATURES];
    for ((value, &idx), name) in values.iter_mut().zip(feature_indices).zip(FEATURE_NAMES) {
        let raw = record.get(idx).map(str::trim).unwrap_or("");
        *value = raw.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
            PredictorError::Dataset(format!(
                "Invalid value '{}' for column '{}' at row {}",
                raw,
                name,
                row_idx + 1
            ))
        })?;
    }
    Ok(FeatureVector::from_array(values))
}
