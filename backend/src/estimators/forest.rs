use std::cmp::Ordering;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{class_index, unique_classes};
use crate::error::ModelError;

#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features tried per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: 16,
            min_samples_split: 2,
            max_features: None,
            seed: None,
        }
    }
}

/// Leaves hold an index into the forest's `classes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn check(&self, n_classes: usize, n_features: usize) -> Result<(), ModelError> {
        match self {
            Node::Leaf { class } if *class >= n_classes => Err(ModelError::Inconsistent(format!(
                "leaf class index {} with {} classes",
                class, n_classes
            ))),
            Node::Leaf { .. } => Ok(()),
            Node::Split { feature, .. } if *feature >= n_features => {
                Err(ModelError::Inconsistent(format!(
                    "split on feature {} with {} features",
                    feature, n_features
                )))
            }
            Node::Split { left, right, .. } => {
                left.check(n_classes, n_features)?;
                right.check(n_classes, n_features)
            }
        }
    }

    fn classify(&self, row: ArrayView1<f64>) -> usize {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<Node>,
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

fn majority(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (idx, &c)| if c > best.1 { (idx, c) } else { best })
        .0
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    targets: &'a [usize],
    n_classes: usize,
    max_features: usize,
    params: &'a ForestParams,
}

impl TreeBuilder<'_> {
    fn counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    /// Best `(feature, threshold, weighted gini)` among a random feature subset.
    fn best_split(&self, indices: &[usize], counts: &[usize], rng: &mut StdRng) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let mut best: Option<(usize, f64, f64)> = None;
        let candidates = rand::seq::index::sample(rng, self.x.ncols(), self.max_features);

        for feature in candidates.iter() {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| {
                self.x[[a, feature]]
                    .partial_cmp(&self.x[[b, feature]])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left = vec![0; self.n_classes];
            let mut right = counts.to_vec();
            for pos in 0..n - 1 {
                let class = self.targets[order[pos]];
                left[class] += 1;
                right[class] -= 1;

                let here = self.x[[order[pos], feature]];
                let next = self.x[[order[pos + 1], feature]];
                if next <= here {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                let score = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                if best.map_or(true, |(_, _, s)| score < s) {
                    best = Some((feature, (here + next) / 2.0, score));
                }
            }
        }
        best
    }

    fn grow(&self, indices: &[usize], depth: usize, rng: &mut StdRng) -> Node {
        let counts = self.counts(indices);
        let impurity = gini(&counts, indices.len());
        if impurity == 0.0
            || depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
        {
            return Node::Leaf {
                class: majority(&counts),
            };
        }

        match self.best_split(indices, &counts, rng) {
            Some((feature, threshold, score)) if score < impurity => {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.x[[i, feature]] <= threshold);
                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(&left, depth + 1, rng)),
                    right: Box::new(self.grow(&right, depth + 1, rng)),
                }
            }
            _ => Node::Leaf {
                class: majority(&counts),
            },
        }
    }
}

impl RandomForest {
    /// Bagged CART trees with gini splits and per-split feature sampling.
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<i64>,
        params: &ForestParams,
    ) -> Result<Self, ModelError> {
        let (rows, n_features) = x.dim();
        if rows == 0 || n_features == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != rows {
            return Err(ModelError::LabelMismatch {
                rows,
                labels: y.len(),
            });
        }

        let classes = unique_classes(y);
        let targets = class_index(&classes, y);
        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
            .clamp(1, n_features);

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let builder = TreeBuilder {
            x: x.view(),
            targets: &targets,
            n_classes: classes.len(),
            max_features,
            params,
        };

        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let sample: Vec<usize> = (0..rows).map(|_| rng.gen_range(0..rows)).collect();
                builder.grow(&sample, 0, &mut rng)
            })
            .collect();

        Ok(RandomForest {
            classes,
            n_features,
            trees,
        })
    }

    /// Every leaf and split must index into `classes` and the feature columns.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() || self.trees.is_empty() {
            return Err(ModelError::NoClasses);
        }
        self.trees
            .iter()
            .try_for_each(|tree| tree.check(self.classes.len(), self.n_features))
    }

    /// Majority vote across trees; ties go to the lower class.
    pub fn predict(&self, rows: ArrayView2<f64>) -> Result<Array1<i64>, ModelError> {
        if rows.ncols() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                got: rows.ncols(),
            });
        }
        if self.classes.is_empty() || self.trees.is_empty() {
            return Err(ModelError::NoClasses);
        }

        Ok(rows
            .rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0; self.classes.len()];
                for tree in &self.trees {
                    votes[tree.classify(row)] += 1;
                }
                self.classes[majority(&votes)]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn gini_of_pure_and_even_sets() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn learns_threshold() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [7.0, 1.0], [8.0, 1.0], [9.0, 1.0]];
        let y = array![1, 1, 1, 2, 2, 2];
        let params = ForestParams {
            n_estimators: 25,
            seed: Some(7),
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(x.view(), y.view(), &params).unwrap();
        assert_eq!(forest.trees.len(), 25);
        let predicted = forest.predict(array![[1.5, 0.0], [8.5, 1.0]].view()).unwrap();
        assert_eq!(predicted.to_vec(), vec![1, 2]);
    }

    #[test]
    fn same_seed_same_forest() {
        let x = array![[1.0, 5.0], [2.0, 4.0], [3.0, 3.0], [4.0, 2.0]];
        let y = array![0, 0, 1, 1];
        let params = ForestParams {
            n_estimators: 10,
            seed: Some(3),
            ..ForestParams::default()
        };
        let a = RandomForest::fit(x.view(), y.view(), &params).unwrap();
        let b = RandomForest::fit(x.view(), y.view(), &params).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn validate_catches_out_of_range_indices() {
        let bad_leaf = RandomForest {
            classes: vec![0, 1, 2],
            n_features: 4,
            trees: vec![Node::Leaf { class: 7 }],
        };
        assert!(matches!(bad_leaf.validate(), Err(ModelError::Inconsistent(_))));

        let bad_split = RandomForest {
            classes: vec![0, 1],
            n_features: 2,
            trees: vec![Node::Split {
                feature: 5,
                threshold: 1.0,
                left: Box::new(Node::Leaf { class: 0 }),
                right: Box::new(Node::Leaf { class: 1 }),
            }],
        };
        assert!(matches!(bad_split.validate(), Err(ModelError::Inconsistent(_))));
    }

    #[test]
    fn fitted_forest_validates() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [8.0, 1.0], [9.0, 1.0]];
        let y = array![0, 0, 1, 1];
        let params = ForestParams {
            n_estimators: 5,
            seed: Some(11),
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(x.view(), y.view(), &params).unwrap();
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn rejects_wrong_width() {
        let x = array![[1.0], [2.0]];
        let y = array![0, 1];
        let forest = RandomForest::fit(x.view(), y.view(), &ForestParams::default()).unwrap();
        assert!(forest.predict(array![[1.0, 2.0]].view()).is_err());
    }
}
