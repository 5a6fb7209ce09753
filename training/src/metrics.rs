use std::fmt;

use backend::{Classifier, ModelError};
use ndarray::{Array2, ArrayView1};

use crate::dataset::Dataset;

/// Fraction of exact label matches; 0.0 for empty input.
pub fn accuracy(y_true: ArrayView1<i64>, y_pred: ArrayView1<i64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    hits as f64 / y_true.len() as f64
}

/// Rows are true classes, columns predicted classes, both in `classes` order.
/// Labels outside `classes` are ignored.
pub fn confusion_matrix(
    y_true: ArrayView1<i64>,
    y_pred: ArrayView1<i64>,
    classes: &[i64],
) -> Array2<usize> {
    let mut matrix = Array2::<usize>::zeros((classes.len(), classes.len()));
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        if let (Some(row), Some(col)) = (
            classes.iter().position(|c| c == t),
            classes.iter().position(|c| c == p),
        ) {
            matrix[[row, col]] += 1;
        }
    }
    matrix
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy: f64,
    pub classes: Vec<i64>,
    pub confusion: Array2<usize>,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.2}", self.accuracy)?;
        writeln!(f, "Confusion matrix (rows = true, cols = predicted):")?;
        write!(f, "{:>6}", "")?;
        for class in &self.classes {
            write!(f, "{:>6}", class)?;
        }
        for (class, row) in self.classes.iter().zip(self.confusion.rows()) {
            writeln!(f)?;
            write!(f, "{:>6}", class)?;
            for count in row {
                write!(f, "{:>6}", count)?;
            }
        }
        Ok(())
    }
}

pub fn evaluate(model: &dyn Classifier, data: &Dataset) -> Result<Evaluation, ModelError> {
    let predicted = model.predict(data.features.view())?;
    let mut classes: Vec<i64> = data.targets.iter().chain(predicted.iter()).copied().collect();
    classes.sort_unstable();
    classes.dedup();

    Ok(Evaluation {
        accuracy: accuracy(data.targets.view(), predicted.view()),
        confusion: confusion_matrix(data.targets.view(), predicted.view(), &classes),
        classes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn accuracy_counts_matches() {
        let y_true = array![0, 1, 2, 2];
        let y_pred = array![0, 2, 2, 2];
        assert_eq!(accuracy(y_true.view(), y_pred.view()), 0.75);
        let empty = ndarray::Array1::<i64>::zeros(0);
        assert_eq!(accuracy(empty.view(), empty.view()), 0.0);
    }

    #[test]
    fn confusion_rows_are_truth() {
        let y_true = array![0, 1, 2, 2];
        let y_pred = array![0, 2, 2, 1];
        let matrix = confusion_matrix(y_true.view(), y_pred.view(), &[0, 1, 2]);
        assert_eq!(matrix, array![[1, 0, 0], [0, 0, 1], [0, 1, 1]]);
    }
}
