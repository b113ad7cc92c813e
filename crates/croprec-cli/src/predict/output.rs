use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use croprec_classifiers::{FeatureVector, Prediction, FEATURE_NAMES, TOP_K};

fn header() -> Vec<String> {
    let mut header: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    header.push("recommended_crop".to_string());
    for rank in 1..=TOP_K {
        header.push(format!("top{}_crop", rank));
        header.push(format!("top{}_probability", rank));
    }
    header
}

fn record(features: &FeatureVector, prediction: &Prediction) -> Vec<String> {
    let mut record: Vec<String> = features.to_array().iter().map(|v| v.to_string()).collect();
    record.push(prediction.recommended_crop.clone());
    for rank in 0..TOP_K {
        match prediction.probabilities.get(rank) {
            Some((crop, p)) => {
                record.push(crop.clone());
                record.push(format!("{:.4}", p));
            }
            None => {
                record.push(String::new());
                record.push(String::new());
            }
        }
    }
    record
}

/// Write one row per scored vector: the inputs, the recommended crop and
/// the ranked top crops.
pub fn write_predictions<W: Write>(
    writer: W,
    delimiter: u8,
    rows: &[(FeatureVector, Prediction)],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    writer.write_record(header())?;
    for (features, prediction) in rows {
        writer.write_record(record(features, prediction))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write predictions to a CSV or TSV file based on its extension, or to
/// stdout as CSV.
pub fn write_prediction_table(
    rows: &[(FeatureVector, Prediction)],
    output_path: Option<&Path>,
) -> Result<()> {
    match output_path {
        Some(path) => {
            let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
                Some("tsv") => b'\t',
                _ => b',',
            };
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            write_predictions(BufWriter::new(file), delimiter, rows)
        }
        None => write_predictions(io::stdout().lock(), b',', rows),
    }
}
