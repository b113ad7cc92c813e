//! The crop predictor: scaling, classification, label decoding and ranking.
//!
//! A `FittedModel` is the atomic unit of a trained predictor. It bundles
//! the random forest with the `Scaler` and `LabelEncoder` it was fitted
//! alongside; there is no way to construct, load or replace one of the
//! three without the other two.
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::ForestConfig;
use crate::data_handling::{Dataset, FeatureVector, N_FEATURES};
use crate::error::PredictorError;
use crate::io::bundle::{load_bundle, save_bundle};
use crate::models::{ClassifierModel, RandomForestClassifier};
use crate::preprocessing::{fit_scaler, transform_all, LabelEncoder, Scaler};
use crate::report::{ClassSummary, TrainingReport};
use crate::stats::{accuracy, argmax, per_class_counts};

/// Number of ranked crops returned with every prediction.
pub const TOP_K: usize = 5;

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Arg-max crop.
    pub recommended_crop: String,
    /// Up to `TOP_K` `(crop, probability)` pairs, highest probability first.
    pub probabilities: Vec<(String, f64)>,
}

impl Prediction {
    pub fn top_probability(&self) -> f64 {
        self.probabilities.first().map_or(0.0, |(_, p)| *p)
    }
}

/// Keep the `k` most probable classes.
///
/// Sorting is stable: classes with equal probability keep their class
/// index order.
pub fn rank_top_k(classes: &[String], proba: &[f64], k: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(usize, f64)> = proba.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(k)
        .map(|(idx, p)| (classes[idx].clone(), p))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    classifier: RandomForestClassifier,
    scaler: Scaler,
    encoder: LabelEncoder,
}

impl FittedModel {
    /// Fit encoder, scaler and forest on `dataset`.
    ///
    /// The scaler only sees the training partition; the held-out partition
    /// is transformed with the same fitted scaler to measure accuracy.
    pub fn fit(
        dataset: &Dataset,
        config: &ForestConfig,
    ) -> Result<(Self, TrainingReport), PredictorError> {
        config.validate()?;
        dataset.check_finite()?;

        let encoder = LabelEncoder::fit(dataset.labels());
        if encoder.len() < 2 {
            return Err(PredictorError::Dataset(format!(
                "training needs at least 2 distinct labels, found {}",
                encoder.len()
            )));
        }
        let y = encoder.transform_all(dataset.labels())?;
        let x = dataset.feature_matrix();

        let split = dataset.train_test_split(config.test_fraction, config.split_seed)?;
        log::info!(
            "Split {} rows into {} training and {} held-out rows (seed {})",
            dataset.len(),
            split.train.len(),
            split.test.len(),
            config.split_seed
        );

        let x_train = x.select_rows(&split.train);
        let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();
        let x_test = x.select_rows(&split.test);
        let y_test: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();

        let scaler = fit_scaler(&x_train)?;
        let x_train_scaled = transform_all(&x_train, &scaler)?;

        let start = Instant::now();
        let mut classifier = RandomForestClassifier::new(config.clone());
        log::info!(
            "Fitting {} with {} trees over {} classes",
            classifier.name(),
            config.n_trees,
            encoder.len()
        );
        classifier.fit(&x_train_scaled, &y_train, encoder.len())?;
        let fit_seconds = start.elapsed().as_secs_f64();

        let x_test_scaled = transform_all(&x_test, &scaler)?;
        let y_pred = classifier.predict(&x_test_scaled)?;
        let held_out_accuracy = accuracy(&y_test, &y_pred);

        let per_class = per_class_counts(&y_test, &y_pred, encoder.len())
            .into_iter()
            .zip(encoder.classes())
            .map(|((support, correct), label)| ClassSummary {
                label: label.clone(),
                support,
                correct,
                recall: (support > 0).then(|| correct as f64 / support as f64),
            })
            .collect();

        let report = TrainingReport {
            n_train: split.train.len(),
            n_test: split.test.len(),
            classes: encoder.classes().to_vec(),
            accuracy: held_out_accuracy,
            per_class,
            fit_seconds,
            trained_at: Utc::now(),
            config: config.clone(),
        };

        let model = FittedModel {
            classifier,
            scaler,
            encoder,
        };
        Ok((model, report))
    }

    pub fn classes(&self) -> &[String] {
        self.encoder.classes()
    }

    pub fn config(&self) -> &ForestConfig {
        self.classifier.config()
    }

    /// Full class distribution in class index order.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictorError> {
        let scaled = self.scaler.transform_row(&features.to_array())?;
        self.classifier.predict_proba_row(&scaled)
    }

    /// Scale, classify, decode and rank one feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictorError> {
        let proba = self.predict_proba(features)?;
        let best = argmax(&proba);
        let recommended_crop = self
            .encoder
            .inverse_transform(best)
            .ok_or_else(|| {
                PredictorError::Dataset(format!("class index {} has no label", best))
            })?
            .to_string();

        Ok(Prediction {
            recommended_crop,
            probabilities: rank_top_k(self.encoder.classes(), &proba, TOP_K),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PredictorError> {
        save_bundle(self, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        Ok(load_bundle(path)?.model)
    }

    /// Structural agreement between the three components.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        self.classifier.validate()?;
        if self.classifier.n_classes() != self.encoder.len() {
            return Err(format!(
                "classifier has {} classes but the label encoder has {}",
                self.classifier.n_classes(),
                self.encoder.len()
            ));
        }
        if self.scaler.n_features() != N_FEATURES || self.classifier.n_features() != N_FEATURES {
            return Err(format!(
                "expected {} features, scaler has {} and classifier has {}",
                N_FEATURES,
                self.scaler.n_features(),
                self.classifier.n_features()
            ));
        }
        if self.scaler.std.len() != self.scaler.mean.len() {
            return Err("scaler mean and std lengths differ".to_string());
        }
        let scale_ok = self.scaler.mean.iter().all(|m| m.is_finite())
            && self.scaler.std.iter().all(|s| s.is_finite() && *s > 0.0);
        if !scale_ok {
            return Err("scaler holds non-finite or non-positive parameters".to_string());
        }
        Ok(())
    }
}

/// Train / predict / save / load facade over an optional `FittedModel`.
#[derive(Debug, Clone, Default)]
pub struct CropPredictor {
    config: ForestConfig,
    model: Option<Arc<FittedModel>>,
}

impl CropPredictor {
    pub fn new(config: ForestConfig) -> Self {
        CropPredictor {
            config,
            model: None,
        }
    }

    pub fn from_model(model: FittedModel) -> Self {
        CropPredictor {
            config: model.config().clone(),
            model: Some(Arc::new(model)),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Shared handle on the fitted model, if any.
    pub fn model(&self) -> Option<Arc<FittedModel>> {
        self.model.clone()
    }

    fn fitted(&self) -> Result<&FittedModel, PredictorError> {
        self.model.as_deref().ok_or(PredictorError::Untrained)
    }

    /// Train on `dataset` and return the held-out accuracy.
    pub fn train(&mut self, dataset: &Dataset) -> Result<f64, PredictorError> {
        Ok(self.train_with_report(dataset)?.accuracy)
    }

    pub fn train_with_report(&mut self, dataset: &Dataset) -> Result<TrainingReport, PredictorError> {
        let (model, report) = FittedModel::fit(dataset, &self.config)?;
        self.model = Some(Arc::new(model));
        Ok(report)
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictorError> {
        self.fitted()?.predict(features)
    }

    /// Every known crop with its probability, in class index order.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<(String, f64)>, PredictorError> {
        let model = self.fitted()?;
        let proba = model.predict_proba(features)?;
        Ok(model.classes().iter().cloned().zip(proba).collect())
    }

    pub fn classes(&self) -> Result<&[String], PredictorError> {
        Ok(self.fitted()?.classes())
    }

    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<(), PredictorError> {
        self.fitted()?.save(path)
    }

    /// Replace the current model with the bundle at `path`.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PredictorError> {
        let model = FittedModel::load(path)?;
        self.config = model.config().clone();
        self.model = Some(Arc::new(model));
        Ok(())
    }
}
