use anyhow::{Context, Result};

use croprec_classifiers::io::read_dataset;
use croprec_classifiers::report::TrainingReport;
use croprec_classifiers::CropPredictor;

use super::input::TrainConfig;

/// Load the training table, fit a predictor, save its bundle and
/// optionally the JSON training report.
pub fn run_training(config: &TrainConfig) -> Result<TrainingReport> {
    let dataset = read_dataset(&config.train_data)
        .with_context(|| format!("Failed to load training data: {}", config.train_data))?;
    log::info!("Loaded {} labelled rows from {}", dataset.len(), config.train_data);
    dataset.log_input_data_summary();

    let mut predictor = CropPredictor::new(config.forest.clone());
    let report = predictor
        .train_with_report(&dataset)
        .context("Training failed")?;
    report.log_summary();

    predictor
        .save_model(&config.output_file)
        .with_context(|| format!("Failed to save model to {}", config.output_file))?;
    log::info!("Model saved to {}", config.output_file);

    if let Some(report_file) = &config.report_file {
        report.write_json(report_file)?;
        log::info!("Training report written to {}", report_file);
    }

    Ok(report)
}
