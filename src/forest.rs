//! Isolation Forest.
//!
//! Points that are isolated by fewer random splits are more anomalous. Scores
//! follow the usual convention: `score_samples` is `-2^(-E[h(x)] / c(n))`, and
//! `decision_function` shifts it by the contamination quantile so that
//! negative values are outliers.

use crate::error::{AnomalyError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand::seq::index;

const EULER_GAMMA: f64 = 0.5772156649015329;

#[derive(Debug, Clone)]
pub enum IsolationTree {
    Internal {
        feature: usize,
        threshold: f64,
        /// Samples with `x[feature] < threshold`.
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
    External {
        size: usize,
    },
}

impl IsolationTree {
    pub fn build(
        x: &Array2<f64>,
        indices: &[usize],
        height: usize,
        max_height: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n_samples = indices.len();
        if height >= max_height || n_samples <= 1 {
            return IsolationTree::External { size: n_samples };
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|feature| {
                let (min, max) = indices.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| (lo.min(x[[i, feature]]), hi.max(x[[i, feature]])),
                );
                (max > min).then_some((feature, min, max))
            })
            .collect();

        let Some(&(feature, min_val, max_val)) = candidates.choose(rng) else {
            return IsolationTree::External { size: n_samples };
        };

        let threshold = rng.gen_range(min_val..max_val);
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature]] < threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return IsolationTree::External { size: n_samples };
        }

        let left = Box::new(Self::build(x, &left_indices, height + 1, max_height, rng));
        let right = Box::new(Self::build(x, &right_indices, height + 1, max_height, rng));

        IsolationTree::Internal {
            feature,
            threshold,
            left,
            right,
        }
    }

    pub fn path_length(&self, sample: ArrayView1<f64>, current_height: usize) -> f64 {
        match self {
            IsolationTree::External { size } => current_height as f64 + average_path_length(*size),
            IsolationTree::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] < *threshold {
                    left.path_length(sample, current_height + 1)
                } else {
                    right.path_length(sample, current_height + 1)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points:
/// c(n) = 2 * H(n-1) - 2(n-1)/n.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// A fitted forest. Immutable once built.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    /// Contamination quantile of the training `score_samples`.
    offset: f64,
}

impl IsolationForest {
    pub fn fit(
        x: &Array2<f64>,
        n_estimators: usize,
        max_samples: usize,
        contamination: f64,
        seed: u64,
    ) -> Result<Self> {
        let n_samples = x.nrows();
        if n_samples < 2 {
            return Err(AnomalyError::InvalidInput(format!(
                "isolation forest needs at least 2 samples, got {n_samples}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = max_samples.clamp(2, n_samples);
        let max_height = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..n_estimators.max(1))
            .map(|_| {
                let indices = index::sample(&mut rng, n_samples, sample_size).into_vec();
                IsolationTree::build(x, &indices, 0, max_height, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };

        let train_scores = forest.score_samples(x);
        let mut sorted: Vec<f64> = train_scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        forest.offset = quantile(&sorted, contamination);

        Ok(forest)
    }

    /// Opposite of the normalized isolation score; lower is more anomalous.
    pub fn score_samples(&self, x: &Array2<f64>) -> Array1<f64> {
        let c_n = average_path_length(self.sample_size);
        x.rows()
            .into_iter()
            .map(|row| {
                let avg_path = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(row, 0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                -(2.0_f64).powf(-avg_path / c_n)
            })
            .collect()
    }

    /// `score_samples - offset`; negative means outlier.
    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        self.score_samples(x) - self.offset
    }

    /// Outlier flag for one `decision_function` value.
    pub fn is_outlier(decision: f64) -> bool {
        decision < 0.0
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outliers() -> Array2<f64> {
        let mut data = Vec::new();
        for i in 0..50 {
            data.push((i % 10) as f64);
            data.push(((i % 10) + 1) as f64);
        }
        data.extend_from_slice(&[100.0, 100.0]);
        data.extend_from_slice(&[-50.0, -50.0]);
        Array2::from_shape_vec((52, 2), data).unwrap()
    }

    #[test]
    fn test_outliers_score_lowest() {
        let x = cluster_with_outliers();
        let forest = IsolationForest::fit(&x, 100, 256, 0.05, 42).unwrap();
        let scores = forest.decision_function(&x);

        assert!(scores[50] < scores[0]);
        assert!(scores[51] < scores[0]);

        let flags: Vec<bool> = scores.iter().map(|&d| IsolationForest::is_outlier(d)).collect();
        assert!(flags[50] && flags[51]);
        let n_flagged = flags.iter().filter(|&&f| f).count();
        assert!(n_flagged >= 2 && n_flagged <= 3);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let x = cluster_with_outliers();
        let a = IsolationForest::fit(&x, 50, 32, 0.1, 7).unwrap();
        let b = IsolationForest::fit(&x, 50, 32, 0.1, 7).unwrap();
        assert_eq!(a.score_samples(&x), b.score_samples(&x));
    }

    #[test]
    fn test_constant_data_builds_leaves() {
        let x = Array2::from_elem((10, 3), 1.0);
        let indices: Vec<usize> = (0..10).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let tree = IsolationTree::build(&x, &indices, 0, 4, &mut rng);
        assert!(matches!(tree, IsolationTree::External { size: 10 }));
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 0.0);
        assert_eq!(quantile(&sorted, 0.5), 2.0);
        assert!((quantile(&sorted, 0.1) - 0.4).abs() < 1e-12);
    }
}
