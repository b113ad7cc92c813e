//! CART classification tree used as the forest's base learner.
//!
//! Trees are stored as a flat node array (root at index 0) so a fitted
//! forest serializes as plain vectors. Splits minimise weighted Gini
//! impurity; each leaf keeps the class frequencies of the training rows
//! that reached it, which is what the forest averages into probabilities.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::math::Array2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of informative features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    nodes: Vec<Node>,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn push_leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let distribution = counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn build(&mut self, indices: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let n = indices.len();
        let counts = self.class_counts(indices);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.params.max_depth.map_or(false, |d| depth >= d);
        let too_small =
            n < self.params.min_samples_split || n < 2 * self.params.min_samples_leaf;
        if pure || too_deep || too_small {
            return self.push_leaf(&counts, n);
        }

        let Some(split) = self.best_split(indices, &counts, rng) else {
            return self.push_leaf(&counts, n);
        };

        let x = self.x;
        let mut mid = 0;
        for pos in 0..n {
            if x[(indices[pos], split.feature)] <= split.threshold {
                indices.swap(pos, mid);
                mid += 1;
            }
        }

        // Reserve the slot so the parent precedes its children.
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });

        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.build(left_idx, depth + 1, rng);
        let right = self.build(right_idx, depth + 1, rng);

        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(
        &self,
        indices: &[usize],
        counts: &[usize],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;

        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in features {
            if visited >= self.params.max_features {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (self.x[(i, feature)], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            // Constant features do not count against the max_features budget.
            if column[0].0 >= column[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();

            for pos in 0..n - 1 {
                let (value, class) = column[pos];
                left[class] += 1;
                right[class] -= 1;

                let next = column[pos + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` listed in `sample_indices`.
    ///
    /// `sample_indices` may contain repeats (bootstrap samples); each
    /// occurrence counts as one training sample.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        sample_indices: &[usize],
        n_classes: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            params,
            nodes: Vec::new(),
        };
        let mut indices = sample_indices.to_vec();
        if indices.is_empty() {
            builder.nodes.push(Node::Leaf {
                distribution: vec![0.0; n_classes],
            });
        } else {
            builder.build(&mut indices, 0, rng);
        }

        DecisionTree {
            nodes: builder.nodes,
            n_features: x.ncols(),
            n_classes,
        }
    }

    /// Class frequencies of the leaf `row` falls into.
    pub fn predict_proba_row(&self, row: &[f64]) -> &[f64] {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    /// Check the node layout a fitted tree always has: a non-empty node
    /// array whose children come after their parent, in-range split
    /// features and one leaf frequency per class.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(format!(
                            "node {} splits on feature {} of {}",
                            id, feature, self.n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", id));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} points to child {} ({} nodes)",
                                id,
                                child,
                                self.nodes.len()
                            ));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != self.n_classes {
                        return Err(format!(
                            "leaf {} holds {} class frequencies, expected {}",
                            id,
                            distribution.len(),
                            self.n_classes
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn separable_data_is_fit_exactly() {
        let x = Array2::from_rows(&[[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [10.0, 5.0], [11.0, 5.0]]);
        let y = [0, 0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3, 4], 2, params(), &mut rng);

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba_row(&[1.5, 5.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba_row(&[10.5, 5.0]), &[0.0, 1.0]);
    }

    #[test]
    fn fitted_tree_is_valid() {
        let x = Array2::from_rows(&[[0.0, 5.0], [1.0, 6.0], [2.0, 5.0], [10.0, 7.0], [11.0, 5.0]]);
        let y = [0, 1, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3, 4], 2, params(), &mut rng);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_broken_layouts() {
        let leaf = |d: Vec<f64>| Node::Leaf { distribution: d };
        let split = |feature, left, right| Node::Split {
            feature,
            threshold: 0.5,
            left,
            right,
        };
        let tree = |nodes| DecisionTree {
            nodes,
            n_features: 2,
            n_classes: 2,
        };

        assert!(tree(vec![]).validate().is_err());
        // child past the end
        assert!(tree(vec![split(0, 1, 999), leaf(vec![1.0, 0.0])])
            .validate()
            .is_err());
        // cycle back to the root
        assert!(tree(vec![split(0, 1, 0), leaf(vec![1.0, 0.0])])
            .validate()
            .is_err());
        assert!(tree(vec![split(5, 1, 2), leaf(vec![1.0, 0.0]), leaf(vec![0.0, 1.0])])
            .validate()
            .is_err());
        assert!(tree(vec![split(1, 1, 2), leaf(vec![1.0]), leaf(vec![0.0, 1.0])])
            .validate()
            .is_err());
        assert!(tree(vec![split(1, 1, 2), leaf(vec![1.0, 0.0]), leaf(vec![0.0, 1.0])])
            .validate()
            .is_ok());
    }

    #[test]
    fn max_depth_zero_yields_class_frequencies() {
        let x = Array2::from_rows(&[[0.0], [1.0], [2.0], [3.0]]);
        let y = [0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let p = TreeParams {
            max_depth: Some(0),
            ..params()
        };
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3], 2, p, &mut rng);
        assert_eq!(tree.predict_proba_row(&[0.0]), &[0.25, 0.75]);
    }

    #[test]
    fn repeated_indices_act_as_weights() {
        let x = Array2::from_rows(&[[0.0], [0.0]]);
        let y = [0, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit(&x, &y, &[0, 0, 0, 1], 2, params(), &mut rng);
        // Identical features: no split possible, leaf keeps weighted frequencies.
        assert_eq!(tree.predict_proba_row(&[0.0]), &[0.75, 0.25]);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x = Array2::from_rows(&[[0.0], [1.0], [2.0], [3.0]]);
        let y = [0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let p = TreeParams {
            min_samples_leaf: 2,
            ..params()
        };
        let tree = DecisionTree::fit(&x, &y, &[0, 1, 2, 3], 2, p, &mut rng);
        assert_eq!(tree.predict_proba_row(&[0.0]), &[0.5, 0.5]);
        assert_eq!(tree.predict_proba_row(&[3.0]), &[0.0, 1.0]);
    }
}
