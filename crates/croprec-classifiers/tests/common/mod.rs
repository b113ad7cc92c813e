//! Synthetic crop table shared by the integration tests.
#![allow(dead_code)]

use croprec_classifiers::{Dataset, FeatureVector, ForestConfig, TrainingRow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-crop feature centres, roughly shaped like the public crop
/// recommendation table. Every pair of crops is separable on at least one
/// feature given the noise in `SPREAD`.
pub const CROPS: [(&str, [f64; 7]); 6] = [
    ("rice", [80.0, 48.0, 40.0, 23.7, 82.0, 6.4, 236.0]),
    ("maize", [77.0, 48.0, 20.0, 22.4, 65.0, 6.2, 84.0]),
    ("chickpea", [40.0, 67.0, 80.0, 18.9, 16.9, 7.3, 80.0]),
    ("kidneybeans", [20.0, 67.0, 20.0, 20.1, 21.6, 5.7, 105.0]),
    ("coffee", [101.0, 28.0, 30.0, 25.5, 58.9, 6.8, 158.0]),
    ("jute", [78.0, 47.0, 40.0, 25.0, 80.0, 6.7, 175.0]),
];

const SPREAD: [f64; 7] = [10.0, 8.0, 5.0, 2.0, 3.0, 0.3, 15.0];

pub const EXAMPLE: [f64; 7] = [90.0, 42.0, 43.0, 20.87, 82.00, 6.5, 202.93];

pub fn synthetic_dataset(rows_per_crop: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(rows_per_crop * CROPS.len());
    for _ in 0..rows_per_crop {
        for (label, centre) in CROPS.iter() {
            let mut values = [0.0; 7];
            for (i, v) in values.iter_mut().enumerate() {
                *v = centre[i] + rng.gen_range(-1.0..1.0) * SPREAD[i];
            }
            rows.push(TrainingRow::new(FeatureVector::from_array(values), *label));
        }
    }
    Dataset::new(rows)
}

/// Route library logs through the test harness; set `RUST_LOG` to see them.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A smaller forest keeps the test suite fast.
pub fn test_config() -> ForestConfig {
    ForestConfig {
        n_trees: 25,
        ..ForestConfig::default()
    }
}

pub fn write_csv(dataset: &Dataset, path: &std::path::Path) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record(["N", "P", "K", "temperature", "humidity", "ph", "rainfall", "label"])
        .unwrap();
    for row in dataset.rows() {
        let mut record: Vec<String> = row.features.to_array().iter().map(|v| v.to_string()).collect();
        record.push(row.label.clone());
        writer.write_record(&record).unwrap();
    }
    writer.flush().unwrap();
}
