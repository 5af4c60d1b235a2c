//! Random Forest - CART trees over small integer features
//!
//! Binary classifier: bootstrap sampling, `sqrt(n_features)` candidates per
//! split, Gini impurity, balanced class weights. Trees are stored as flat
//! node arenas (root at index 0) so the whole forest serializes as plain
//! JSON.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_SEED;

/// Number of classes (legitimate, malicious)
pub const N_CLASSES: usize = 2;

/// Smallest impurity decrease accepted as a split
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("label {0} is not a class index")]
    InvalidLabel(usize),

    #[error("node references feature {feature} but input has {len} features")]
    FeatureOutOfRange { feature: usize, len: usize },

    #[error("tree {tree} is malformed at node {node}")]
    MalformedTree { tree: usize, node: usize },

    #[error("forest has no trees")]
    EmptyForest,
}

// ============================================================================
// CONFIG
// ============================================================================

/// Forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: DEFAULT_SEED,
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

/// One arena node; a leaf has no children and carries a class distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionNode {
    pub feature_index: usize,
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_child: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_child: Option<usize>,
    /// Weighted class distribution at a leaf, normalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<[f64; N_CLASSES]>,
    /// Distinct training samples that reached the node
    pub samples: usize,
    pub impurity: f64,
}

impl DecisionNode {
    fn leaf(distribution: [f64; N_CLASSES], samples: usize, impurity: f64) -> Self {
        Self {
            feature_index: 0,
            threshold: 0.0,
            left_child: None,
            right_child: None,
            distribution: Some(distribution),
            samples,
            impurity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<DecisionNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf
    fn leaf_distribution(&self, tree: usize, x: &[f64]) -> Result<[f64; N_CLASSES], ModelError> {
        let malformed = |node| ModelError::MalformedTree { tree, node };
        let mut index = 0;
        // a well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(index).ok_or_else(|| malformed(index))?;
            if let Some(distribution) = node.distribution {
                return Ok(distribution);
            }
            let value = x.get(node.feature_index).ok_or(ModelError::FeatureOutOfRange {
                feature: node.feature_index,
                len: x.len(),
            })?;
            let next = if *value <= node.threshold { node.left_child } else { node.right_child };
            index = next.ok_or_else(|| malformed(index))?;
        }
        Err(malformed(index))
    }
}

/// Weighted training sample view used while growing
struct Sample {
    row: usize,
    class: usize,
    weight: f64,
}

fn gini(totals: &[f64; N_CLASSES]) -> f64 {
    let sum: f64 = totals.iter().sum();
    if sum <= 0.0 {
        return 0.0;
    }
    1.0 - totals.iter().map(|t| (t / sum) * (t / sum)).sum::<f64>()
}

fn class_totals(samples: &[Sample]) -> [f64; N_CLASSES] {
    let mut totals = [0.0; N_CLASSES];
    for s in samples {
        totals[s.class] += s.weight;
    }
    totals
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    children_impurity: f64,
}

struct TreeBuilder<'a, R: AsRef<[f64]>> {
    x: &'a [R],
    config: &'a ForestConfig,
    max_features: usize,
    n_features: usize,
    nodes: Vec<DecisionNode>,
    importances: Vec<f64>,
    rng: ChaCha20Rng,
}

impl<'a, R: AsRef<[f64]>> TreeBuilder<'a, R> {
    fn value(&self, s: &Sample, feature: usize) -> f64 {
        self.x[s.row].as_ref()[feature]
    }

    /// Grow a subtree over `samples`, returning its arena index
    fn grow(&mut self, mut samples: Vec<Sample>, depth: usize) -> usize {
        let totals = class_totals(&samples);
        let weight: f64 = totals.iter().sum();
        let impurity = gini(&totals);
        let index = self.nodes.len();
        let distribution = if weight > 0.0 {
            [totals[0] / weight, totals[1] / weight]
        } else {
            [0.5, 0.5]
        };
        self.nodes.push(DecisionNode::leaf(distribution, samples.len(), impurity));

        if depth >= self.config.max_depth
            || samples.len() < self.config.min_samples_split
            || impurity <= 0.0
        {
            return index;
        }

        let Some(best) = self.best_split(&mut samples) else {
            return index;
        };
        let decrease = weight * impurity - best.children_impurity;
        if decrease <= MIN_IMPURITY_DECREASE {
            return index;
        }
        self.importances[best.feature] += decrease;

        let (left, right): (Vec<Sample>, Vec<Sample>) = samples
            .into_iter()
            .partition(|s| self.x[s.row].as_ref()[best.feature] <= best.threshold);

        let left_index = self.grow(left, depth + 1);
        let right_index = self.grow(right, depth + 1);

        let node = &mut self.nodes[index];
        node.feature_index = best.feature;
        node.threshold = best.threshold;
        node.left_child = Some(left_index);
        node.right_child = Some(right_index);
        node.distribution = None;
        index
    }

    /// Search shuffled features until `max_features` non-constant ones were tried
    fn best_split(&mut self, samples: &mut [Sample]) -> Option<BestSplit> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;
        for feature in features {
            if visited >= self.max_features {
                break;
            }
            samples.sort_by(|a, b| self.value(a, feature).total_cmp(&self.value(b, feature)));
            let first = self.value(&samples[0], feature);
            let last = self.value(&samples[samples.len() - 1], feature);
            if first == last {
                // constant here, does not count toward max_features
                continue;
            }
            visited += 1;

            let totals = class_totals(samples);
            let mut left = [0.0; N_CLASSES];
            for i in 0..samples.len() - 1 {
                left[samples[i].class] += samples[i].weight;
                let here = self.value(&samples[i], feature);
                let next = self.value(&samples[i + 1], feature);
                if here == next {
                    continue;
                }
                let right = [totals[0] - left[0], totals[1] - left[1]];
                let wl: f64 = left.iter().sum();
                let wr: f64 = right.iter().sum();
                let children = wl * gini(&left) + wr * gini(&right);
                if best.as_ref().map_or(true, |b| children < b.children_impurity) {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        children_impurity: children,
                    });
                }
            }
        }

        best
    }
}

// ============================================================================
// FOREST
// ============================================================================

/// Trained, immutable forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub config: ForestConfig,
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
    /// Normalized mean decrease in impurity per feature
    pub importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on rows `x` with class indices `y`
    pub fn fit<R: AsRef<[f64]>>(x: &[R], y: &[usize], config: &ForestConfig) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ModelError::ShapeMismatch { rows: x.len(), labels: y.len() });
        }
        if let Some(bad) = y.iter().find(|c| **c >= N_CLASSES) {
            return Err(ModelError::InvalidLabel(*bad));
        }

        let n = x.len();
        let n_features = x[0].as_ref().len();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);

        // balanced weights over the full training labels
        let mut counts = [0usize; N_CLASSES];
        for c in y {
            counts[*c] += 1;
        }
        let class_weight: Vec<f64> = counts
            .iter()
            .map(|&c| if c == 0 { 0.0 } else { n as f64 / (N_CLASSES as f64 * c as f64) })
            .collect();

        let mut master = ChaCha20Rng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        let mut per_tree_importances = Vec::with_capacity(config.n_trees);

        for _ in 0..config.n_trees {
            let mut rng = ChaCha20Rng::seed_from_u64(master.gen());

            let mut drawn = vec![0usize; n];
            for _ in 0..n {
                drawn[rng.gen_range(0..n)] += 1;
            }
            let samples: Vec<Sample> = drawn
                .iter()
                .enumerate()
                .filter(|(_, k)| **k > 0)
                .map(|(row, k)| Sample {
                    row,
                    class: y[row],
                    weight: *k as f64 * class_weight[y[row]],
                })
                .collect();

            let mut builder = TreeBuilder {
                x,
                config,
                max_features,
                n_features,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
                rng,
            };
            builder.grow(samples, 0);

            trees.push(DecisionTree { nodes: builder.nodes });
            per_tree_importances.push(builder.importances);
        }

        let importances = average_importances(&per_tree_importances, n_features);
        log::debug!(
            "Fitted {} trees on {} rows ({} features, {} per split)",
            trees.len(),
            n,
            n_features,
            max_features
        );

        Ok(Self {
            config: config.clone(),
            n_features,
            trees,
            importances,
        })
    }

    /// Mean class distribution over all trees
    pub fn predict_proba(&self, x: &[f64]) -> Result<[f64; N_CLASSES], ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::EmptyForest);
        }
        let mut sum = [0.0; N_CLASSES];
        for (i, tree) in self.trees.iter().enumerate() {
            let d = tree.leaf_distribution(i, x)?;
            sum[0] += d[0];
            sum[1] += d[1];
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }

    /// Most probable class, ties go to class 0
    pub fn predict(&self, x: &[f64]) -> Result<usize, ModelError> {
        let p = self.predict_proba(x)?;
        Ok(argmax(&p))
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

pub fn argmax(p: &[f64; N_CLASSES]) -> usize {
    if p[1] > p[0] { 1 } else { 0 }
}

/// Normalize each tree, average trees that split, renormalize
fn average_importances(per_tree: &[Vec<f64>], n_features: usize) -> Vec<f64> {
    let mut sum = vec![0.0; n_features];
    let mut contributing = 0usize;
    for tree in per_tree {
        let total: f64 = tree.iter().sum();
        if total <= 0.0 {
            continue;
        }
        contributing += 1;
        for (s, v) in sum.iter_mut().zip(tree) {
            *s += v / total;
        }
    }

    let total: f64 = sum.iter().sum();
    if contributing == 0 || total <= 0.0 {
        return vec![1.0 / n_features.max(1) as f64; n_features];
    }
    sum.iter().map(|v| v / total).collect()
}
