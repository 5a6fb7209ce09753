//! Estimators that can be trained offline and served from a JSON artefact.

pub mod forest;
pub mod logistic;

use ndarray::ArrayView1;

pub use forest::{ForestParams, RandomForest};
pub use logistic::{LogisticParams, LogisticRegression};

/// Sorted distinct labels.
pub(crate) fn unique_classes(y: ArrayView1<i64>) -> Vec<i64> {
    let mut classes: Vec<i64> = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Position of each label inside `classes`.
pub(crate) fn class_index(classes: &[i64], y: ArrayView1<i64>) -> Vec<usize> {
    y.iter()
        .map(|label| classes.binary_search(label).unwrap_or_default())
        .collect()
}
