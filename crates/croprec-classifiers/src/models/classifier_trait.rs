use crate::error::PredictorError;
use crate::math::Array2;
use crate::stats::argmax;

/// Contract for multi-class classifiers over a dense feature matrix.
///
/// Labels are dense class indices in `0..n_classes`, as produced by
/// `LabelEncoder`.
pub trait ClassifierModel {
    /// Fit the model on rows of `x` with class indices `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), PredictorError>;

    /// Class probabilities, one row per sample and one column per class.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, PredictorError>;

    /// Most probable class per sample. Ties resolve to the lowest index.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, PredictorError> {
        let proba = self.predict_proba(x)?;
        Ok(proba.rows().map(argmax).collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
