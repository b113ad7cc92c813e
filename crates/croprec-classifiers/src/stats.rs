//! Classification metrics used to evaluate a fitted model on held-out rows.

/// Index of the largest value. Ties resolve to the first (lowest) index;
/// NaN entries never win.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    best
}

/// Fraction of predictions equal to the true class.
///
/// Returns 0.0 for empty input.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "true and predicted labels must have equal length"
    );
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Per-class `(support, correct)` counts over `n_classes` classes.
pub fn per_class_counts(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<(usize, usize)> {
    let mut counts = vec![(0usize, 0usize); n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if let Some(entry) = counts.get_mut(t) {
            entry.0 += 1;
            if t == p {
                entry.1 += 1;
            }
        }
    }
    counts
}
