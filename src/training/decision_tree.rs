//! Decision tree implementation

use crate::error::{AbdmfError, Result};
use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the class distribution of its samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity
    #[default]
    Gini,
    /// Shannon entropy
    Entropy,
}

impl Criterion {
    /// Impurity of a node from its class counts
    pub fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum::<f64>()
            }
            Criterion::Entropy => counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    -p * p.log2()
                })
                .sum(),
        }
    }
}

/// Classification tree (CART)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random for each split (all when `None`)
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for feature sampling
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Class labels, in the order of leaf distributions
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Working data shared by the recursive build
struct BuildContext<'a> {
    x: &'a Array2<f64>,
    labels: &'a [usize],
    n_classes: usize,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Set max depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set min samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set min samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree on every row of `x`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(AbdmfError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let (classes, labels) = encode_labels(y)?;
        let samples: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));

        self.fit_samples(x, &labels, &classes, &samples, &mut rng)?;
        Ok(self)
    }

    /// Fit on a (possibly repeated) subset of rows with pre-encoded labels.
    ///
    /// `labels[i]` indexes into `classes`; leaf distributions follow the order
    /// of `classes` even when some class is absent from `samples`.
    pub(crate) fn fit_samples(
        &mut self,
        x: &Array2<f64>,
        labels: &[usize],
        classes: &[f64],
        samples: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if samples.is_empty() {
            return Err(AbdmfError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.classes = classes.to_vec();

        let mut ctx = BuildContext {
            x,
            labels,
            n_classes: classes.len(),
            importances: vec![0.0; x.ncols()],
        };
        let root = self.build_tree(&mut ctx, samples, 0, rng);

        let total: f64 = ctx.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut ctx.importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(ctx.importances));
        self.root = Some(root);
        Ok(())
    }

    fn class_counts(&self, ctx: &BuildContext<'_>, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; ctx.n_classes];
        for &i in samples {
            counts[ctx.labels[i]] += 1;
        }
        counts
    }

    fn leaf(counts: &[usize], n_samples: usize) -> TreeNode {
        let distribution = counts
            .iter()
            .map(|&c| c as f64 / n_samples as f64)
            .collect();
        TreeNode::Leaf {
            distribution,
            n_samples,
        }
    }

    fn build_tree(
        &self,
        ctx: &mut BuildContext<'_>,
        samples: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = samples.len();
        let counts = self.class_counts(ctx, samples);
        let impurity = self.criterion.impurity(&counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON;

        if should_stop {
            return Self::leaf(&counts, n_samples);
        }

        let Some((feature_idx, threshold, gain)) =
            self.find_best_split(ctx, samples, &counts, impurity, rng)
        else {
            return Self::leaf(&counts, n_samples);
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| ctx.x[[i, feature_idx]] <= threshold);

        ctx.importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(ctx, &left_samples, depth + 1, rng));
        let right = Box::new(self.build_tree(ctx, &right_samples, depth + 1, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Best (feature, threshold, gain) over a random feature subset.
    ///
    /// Each candidate feature is sorted once and swept left to right, moving
    /// one sample at a time from the right partition to the left.
    fn find_best_split(
        &self,
        ctx: &BuildContext<'_>,
        samples: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = ctx.x.ncols();
        if n_features == 0 {
            return None;
        }
        let k = self.max_features.unwrap_or(n_features).clamp(1, n_features);
        let candidates = index::sample(rng, n_features, k).into_vec();

        let n = samples.len();
        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in candidates {
            let mut column: Vec<(f64, usize)> = samples
                .iter()
                .map(|&i| (ctx.x[[i, feature_idx]], ctx.labels[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = vec![0usize; ctx.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for pos in 0..n - 1 {
                let (value, label) = column[pos];
                left_counts[label] += 1;
                right_counts[label] -= 1;

                let next_value = column[pos + 1].0;
                if next_value <= value {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * self.criterion.impurity(&left_counts, n_left)
                    + n_right as f64 * self.criterion.impurity(&right_counts, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    let threshold = value + (next_value - value) / 2.0;
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    /// Class probabilities, one row per sample, columns ordered as `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or(AbdmfError::ModelNotTrained("prediction"))?;
        self.check_features(x)?;

        let n_classes = self.classes.len();
        let mut proba = Array2::<f64>::zeros((x.nrows(), n_classes));
        for (i, row) in x.outer_iter().enumerate() {
            let sample: Vec<f64> = row.to_vec();
            for (j, p) in self.leaf_distribution(root, &sample).iter().enumerate() {
                proba[[i, j]] = *p;
            }
        }
        Ok(proba)
    }

    /// Predicted class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .outer_iter()
            .map(|row| self.classes[argmax(row.iter().copied())])
            .collect())
    }

    pub(crate) fn leaf_distribution<'a>(&self, node: &'a TreeNode, sample: &[f64]) -> &'a [f64] {
        match node {
            TreeNode::Leaf { distribution, .. } => distribution.as_slice(),
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    self.leaf_distribution(left, sample)
                } else {
                    self.leaf_distribution(right, sample)
                }
            }
        }
    }

    pub(crate) fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(AbdmfError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Normalized impurity-decrease importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Class labels known to the tree
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 0,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

/// Index of the largest value; ties resolve to the first.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = i;
        }
    }
    best_idx
}

/// Sorted distinct classes and each target's index into them.
pub(crate) fn encode_labels(y: &Array1<f64>) -> Result<(Vec<f64>, Vec<usize>)> {
    if y.iter().any(|v| !v.is_finite()) {
        return Err(AbdmfError::InvalidInput(
            "target values must be finite".to_string(),
        ));
    }

    let mut classes: Vec<f64> = y.iter().copied().collect();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();

    let labels = y
        .iter()
        .map(|v| {
            classes
                .binary_search_by(|c| c.total_cmp(v))
                .map_err(|_| AbdmfError::TrainingError(format!("unknown class {}", v)))
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok((classes, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_simple() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0, 0.0];

        let mut tree = DecisionTree::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba.ncols(), 2);
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();

        // The only pure cut isolates one sample, which the leaf floor forbids
        assert!(tree.get_n_leaves() <= 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_entropy_criterion() {
        assert!((Criterion::Entropy.impurity(&[5, 5], 10) - 1.0).abs() < 1e-12);
        assert!((Criterion::Gini.impurity(&[5, 5], 10) - 0.5).abs() < 1e-12);
        assert_eq!(Criterion::Gini.impurity(&[4, 0], 4), 0.0);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        let result = tree.predict(&array![[1.0]]);
        assert!(matches!(result, Err(AbdmfError::ModelNotTrained(_))));
    }

    #[test]
    fn test_predict_wrong_width() {
        let mut tree = DecisionTree::new();
        tree.fit(&array![[1.0, 2.0], [3.0, 4.0]], &array![0.0, 1.0]).unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(AbdmfError::ShapeError { .. })
        ));
    }
}
