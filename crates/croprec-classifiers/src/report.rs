//! Training summary produced alongside the held-out accuracy.
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ForestConfig;

/// Held-out performance for one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub label: String,
    /// Held-out rows of this crop.
    pub support: usize,
    pub correct: usize,
    /// `correct / support`, or `None` when the crop has no held-out rows.
    pub recall: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub classes: Vec<String>,
    pub accuracy: f64,
    pub per_class: Vec<ClassSummary>,
    pub fit_seconds: f64,
    pub trained_at: DateTime<Utc>,
    pub config: ForestConfig,
}

impl TrainingReport {
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn log_summary(&self) {
        log::info!("----- Training Summary -----");
        log::info!(
            "{} training rows, {} held-out rows, {} crops",
            self.n_train,
            self.n_test,
            self.n_classes()
        );
        log::info!(
            "Forest of {} trees fitted in {:.2}s",
            self.config.n_trees,
            self.fit_seconds
        );
        log::info!("Held-out accuracy: {:.2}%", self.accuracy * 100.0);
        for class in &self.per_class {
            match class.recall {
                Some(recall) => log::debug!(
                    "  {:<14} recall {:>6.2}% ({}/{})",
                    class.label,
                    recall * 100.0,
                    class.correct,
                    class.support
                ),
                None => log::debug!("  {:<14} no held-out rows", class.label),
            }
        }
        log::info!("----------------------------");
    }

    /// Write the report as pretty JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write training report: {}", path.as_ref().display()))?;
        Ok(())
    }
}
