//! Data structures for the crop recommendation dataset.
//!
//! This module defines `FeatureVector`, `TrainingRow` and `Dataset`, along
//! with the seeded train/test partitioning used by training.
use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::PredictorError;
use crate::math::Array2;

/// Number of soil/climate readings in one feature vector.
pub const N_FEATURES: usize = 7;

/// Canonical feature names, in model column order.
pub const FEATURE_NAMES: [&str; N_FEATURES] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// The seven soil/climate readings for one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Nitrogen content of the soil
    #[serde(rename = "N")]
    pub n: f64,
    /// Phosphorus content of the soil
    #[serde(rename = "P")]
    pub p: f64,
    /// Potassium content of the soil
    #[serde(rename = "K")]
    pub k: f64,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Soil pH
    pub ph: f64,
    /// Rainfall in mm
    pub rainfall: f64,
}

impl FeatureVector {
    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        let [n, p, k, temperature, humidity, ph, rainfall] = values;
        FeatureVector {
            n,
            p,
            k,
            temperature,
            humidity,
            ph,
            rainfall,
        }
    }

    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// One labelled row of the training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub label: String,
}

impl TrainingRow {
    pub fn new(features: FeatureVector, label: impl Into<String>) -> Self {
        TrainingRow {
            features,
            label: label.into(),
        }
    }
}

/// Row indices of the training and held-out partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<TrainingRow>,
}

impl Dataset {
    pub fn new(rows: Vec<TrainingRow>) -> Self {
        Dataset { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|r| r.label.as_str())
    }

    /// Row counts per label, in label order.
    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in self.labels() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Features of every row as an (n_rows, 7) matrix.
    pub fn feature_matrix(&self) -> Array2<f64> {
        let rows: Vec<[f64; N_FEATURES]> = self.rows.iter().map(|r| r.features.to_array()).collect();
        Array2::from_rows(&rows)
    }

    /// Fail on the first NaN or infinite feature value.
    pub fn check_finite(&self) -> Result<(), PredictorError> {
        for (row_idx, row) in self.rows.iter().enumerate() {
            let values = row.features.to_array();
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(PredictorError::Dataset(format!(
                    "Invalid value '{}' for column '{}' at row {}",
                    values[col],
                    FEATURE_NAMES[col],
                    row_idx + 1
                )));
            }
        }
        Ok(())
    }

    pub fn log_input_data_summary(&self) {
        let counts = self.label_counts();
        log::info!(
            "Dataset: {} rows, {} distinct crops, {} feature columns",
            self.len(),
            counts.len(),
            N_FEATURES
        );
        for (label, count) in &counts {
            log::debug!("  {}: {} rows", label, count);
        }
    }

    /// Partition row indices into training and held-out sets.
    ///
    /// Indices are shuffled with a `StdRng` seeded from `seed`; the first
    /// `ceil(n * test_fraction)` shuffled indices form the held-out set and
    /// the remainder the training set. The same seed always produces the
    /// same partition.
    pub fn train_test_split(
        &self,
        test_fraction: f64,
        seed: u64,
    ) -> Result<TrainTestSplit, PredictorError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PredictorError::InvalidConfig(format!(
                "test_fraction must lie strictly between 0 and 1, got {}",
                test_fraction
            )));
        }

        let n = self.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(PredictorError::Dataset(format!(
                "{} rows are not enough for a {:.0}% held-out split",
                n,
                test_fraction * 100.0
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test);
        Ok(TrainTestSplit {
            train,
            test: indices,
        })
    }
}

impl FromIterator<TrainingRow> for Dataset {
    fn from_iter<I: IntoIterator<Item = TrainingRow>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        (0..n)
            .map(|i| {
                let v = i as f64;
                TrainingRow::new(
                    FeatureVector::from_array([v, v, v, v, v, v, v]),
                    if i % 2 == 0 { "rice" } else { "maize" },
                )
            })
            .collect()
    }

    #[test]
    fn feature_vector_array_round_trip() {
        let fv = FeatureVector::from_array([90.0, 42.0, 43.0, 20.87, 82.0, 6.5, 202.93]);
        assert_eq!(fv.n, 90.0);
        assert_eq!(fv.rainfall, 202.93);
        assert_eq!(fv.to_array()[5], 6.5);
    }

    #[test]
    fn split_is_eighty_twenty_and_disjoint() {
        let ds = dataset(10);
        let split = ds.train_test_split(0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn split_rounds_held_out_size_up() {
        let split = dataset(11).train_test_split(0.2, 1).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        let ds = dataset(50);
        assert_eq!(
            ds.train_test_split(0.2, 42).unwrap(),
            ds.train_test_split(0.2, 42).unwrap()
        );
    }

    #[test]
    fn split_rejects_tiny_datasets() {
        assert!(matches!(
            dataset(1).train_test_split(0.2, 42),
            Err(PredictorError::Dataset(_))
        ));
        assert!(matches!(
            dataset(0).train_test_split(0.2, 42),
            Err(PredictorError::Dataset(_))
        ));
    }

    #[test]
    fn split_rejects_out_of_range_fraction() {
        assert!(matches!(
            dataset(10).train_test_split(1.0, 42),
            Err(PredictorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn label_counts_are_sorted_by_label() {
        let ds = dataset(5);
        let counts = ds.label_counts();
        let labels: Vec<&str> = counts.keys().copied().collect();
        assert_eq!(labels, vec!["maize", "rice"]);
        assert_eq!(counts["rice"], 3);
    }
}
