//! Bagged ensemble of randomized CART trees.
//!
//! Each tree is grown on a bootstrap sample of the training rows and looks
//! at a random subset of features at every split. Class probabilities are
//! the mean of the per-tree leaf frequencies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestConfig;
use crate::error::PredictorError;
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    pub fn new(config: ForestConfig) -> Self {
        RandomForestClassifier {
            config,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Check every tree against the forest's feature and class counts.
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_fitted() {
            return Err("classifier holds no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(format!(
                    "tree {} has {} features and {} classes, forest has {} and {}",
                    i,
                    tree.n_features(),
                    tree.n_classes(),
                    self.n_features,
                    self.n_classes
                ));
            }
            tree.validate().map_err(|reason| format!("tree {}: {}", i, reason))?;
        }
        Ok(())
    }

    /// Class probabilities for a single (already scaled) row.
    pub fn predict_proba_row(&self, row: &[f64]) -> Result<Vec<f64>, PredictorError> {
        if !self.is_fitted() {
            return Err(PredictorError::Untrained);
        }
        if row.len() != self.n_features {
            return Err(PredictorError::FeatureMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut proba = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.predict_proba_row(row)) {
                *p += v;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in proba.iter_mut() {
            *p /= n_trees;
        }
        Ok(proba)
    }
}

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), PredictorError> {
        self.config.validate()?;

        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(PredictorError::Dataset(
                "cannot fit a forest on zero rows".to_string(),
            ));
        }
        if y.len() != n_samples {
            return Err(PredictorError::Dataset(format!(
                "feature matrix has {} rows but {} labels were given",
                n_samples,
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(PredictorError::Dataset(format!(
                "class index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(n_features),
        };

        // Per-tree seeds are drawn up front so the forest does not depend on
        // rayon's scheduling.
        let mut rng = StdRng::seed_from_u64(self.config.forest_seed);
        let seeds: Vec<u64> = (0..self.config.n_trees).map(|_| rng.gen()).collect();
        let bootstrap = self.config.bootstrap;

        log::debug!(
            "Fitting {} trees on {} rows x {} features ({} classes, {} features per split)",
            seeds.len(),
            n_samples,
            n_features,
            n_classes,
            params.max_features
        );

        let trees: Vec<DecisionTree> = seeds
            .par_iter()
            .map(|&seed| {
                let mut tree_rng = StdRng::seed_from_u64(seed);
                let indices: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| tree_rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(x, y, &indices, n_classes, params, &mut tree_rng)
            })
            .collect();

        log::trace!(
            "Forest grown: mean depth {:.1}, mean leaves {:.1}",
            trees.iter().map(|t| t.depth() as f64).sum::<f64>() / trees.len() as f64,
            trees.iter().map(|t| t.n_leaves() as f64).sum::<f64>() / trees.len() as f64
        );

        self.trees = trees;
        self.n_features = n_features;
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PredictorError> {
        let mut out = Vec::with_capacity(x.nrows() * self.n_classes);
        for row in x.rows() {
            out.extend(self.predict_proba_row(row)?);
        }
        Ok(Array2::from_shape_vec((x.nrows(), self.n_classes), out)?)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
