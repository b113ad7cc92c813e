//! Feature scaling and label encoding.
//!
//! Both transforms are fitted once at training time and then travel with
//! the classifier inside a `FittedModel`; they are never refit at
//! inference time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::PredictorError;
use crate::math::Array2;

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Scale a single row.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PredictorError> {
        if row.len() != self.n_features() {
            return Err(PredictorError::FeatureMismatch {
                expected: self.n_features(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features.
///
/// A constant column gets a std of 1.0, so it is only centred.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler, PredictorError> {
    let (nrows, ncols) = x.shape();
    if nrows == 0 || ncols == 0 {
        return Err(PredictorError::Dataset(
            "cannot fit a scaler on an empty feature matrix".to_string(),
        ));
    }

    if let Some((row, col)) = x
        .rows()
        .enumerate()
        .find_map(|(r, row)| row.iter().position(|v| !v.is_finite()).map(|c| (r, c)))
    {
        return Err(PredictorError::Dataset(format!(
            "non-finite value in feature column {} at training row {}",
            col,
            row + 1
        )));
    }

    let mut mean = vec![0.0f64; ncols];
    for row in x.rows() {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    let nrows_f = nrows as f64;
    for m in mean.iter_mut() {
        *m /= nrows_f;
    }

    let mut var = vec![0.0f64; ncols];
    for row in x.rows() {
        for c in 0..ncols {
            let d = row[c] - mean[c];
            var[c] += d * d;
        }
    }
    let std = var
        .into_iter()
        .map(|v| {
            let s = (v / nrows_f).sqrt();
            if s > f64::EPSILON {
                s
            } else {
                1.0
            }
        })
        .collect();

    Ok(Scaler { mean, std })
}

/// Transform all rows using the provided `Scaler` and return a new matrix.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>, PredictorError> {
    let (nrows, ncols) = x.shape();
    if ncols != sc.n_features() {
        return Err(PredictorError::FeatureMismatch {
            expected: sc.n_features(),
            actual: ncols,
        });
    }

    let mut out = Vec::with_capacity(nrows * ncols);
    for row in x.rows() {
        out.extend(
            row.iter()
                .zip(sc.mean.iter().zip(&sc.std))
                .map(|(v, (m, s))| (v - m) / s),
        );
    }

    Ok(Array2::from_shape_vec((nrows, ncols), out)?)
}

/// Bijection between crop names and dense class indices.
///
/// Classes are indexed in sorted (byte-wise) order of the distinct labels
/// seen at fit time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        LabelEncoder {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    pub fn transform_all<I, S>(&self, labels: I) -> Result<Vec<usize>, PredictorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|l| {
                let l = l.as_ref();
                self.transform(l)
                    .ok_or_else(|| PredictorError::UnknownLabel(l.to_string()))
            })
            .collect()
    }

    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}
