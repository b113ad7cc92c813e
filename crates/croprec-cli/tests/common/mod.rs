//! Small synthetic crop table for the CLI and service tests.
#![allow(dead_code)]

use std::path::Path;

use croprec_classifiers::{CropPredictor, Dataset, FeatureVector, ForestConfig, TrainingRow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CROPS: [(&str, [f64; 7]); 6] = [
    ("rice", [80.0, 48.0, 40.0, 23.7, 82.0, 6.4, 236.0]),
    ("maize", [77.0, 48.0, 20.0, 22.4, 65.0, 6.2, 84.0]),
    ("chickpea", [40.0, 67.0, 80.0, 18.9, 16.9, 7.3, 80.0]),
    ("kidneybeans", [20.0, 67.0, 20.0, 20.1, 21.6, 5.7, 105.0]),
    ("coffee", [101.0, 28.0, 30.0, 25.5, 58.9, 6.8, 158.0]),
    ("jute", [78.0, 47.0, 40.0, 25.0, 80.0, 6.7, 175.0]),
];

const SPREAD: [f64; 7] = [10.0, 8.0, 5.0, 2.0, 3.0, 0.3, 15.0];

pub fn crop_names() -> Vec<&'static str> {
    CROPS.iter().map(|(name, _)| *name).collect()
}

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

pub fn trained_predictor() -> CropPredictor {
    let mut predictor = CropPredictor::new(ForestConfig {
        n_trees: 15,
        ..ForestConfig::default()
    });
    predictor.train(&synthetic_dataset(30, 7)).unwrap();
    predictor
}

pub fn write_csv(dataset: &Dataset, path: &Path) {
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
