use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{class_index, unique_classes};
use crate::error::ModelError;

#[derive(Debug, Clone)]
pub struct LogisticParams {
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Inverse L2 strength, as in scikit-learn.
    pub c: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        LogisticParams {
            max_iter: 1000,
            learning_rate: 0.5,
            c: 1.0,
        }
    }
}

/// Multinomial logistic regression over standardised features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    /// Shape `(n_classes, n_features)`.
    pub coef: Array2<f64>,
    pub intercept: Array1<f64>,
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
}

fn softmax_rows(logits: &mut Array2<f64>) {
    for mut row in logits.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

impl LogisticRegression {
    /// Full-batch gradient descent on the penalised cross-entropy.
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<i64>,
        params: &LogisticParams,
    ) -> Result<Self, ModelError> {
        let (rows, features) = x.dim();
        if rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != rows {
            return Err(ModelError::LabelMismatch {
                rows,
                labels: y.len(),
            });
        }

        let classes = unique_classes(y);
        let k = classes.len();
        let targets = class_index(&classes, y);

        let mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyTrainingSet)?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        let z = (&x - &mean) / &scale;

        let mut one_hot = Array2::<f64>::zeros((rows, k));
        for (row, &target) in targets.iter().enumerate() {
            one_hot[[row, target]] = 1.0;
        }

        let n = rows as f64;
        let penalty = 1.0 / (params.c * n);
        let mut coef = Array2::<f64>::zeros((k, features));
        let mut intercept = Array1::<f64>::zeros(k);

        for _ in 0..params.max_iter {
            let mut probs = z.dot(&coef.t()) + &intercept;
            softmax_rows(&mut probs);
            let diff = probs - &one_hot;

            let grad_coef = diff.t().dot(&z) / n + &coef * penalty;
            let grad_intercept = diff.sum_axis(Axis(0)) / n;

            coef.scaled_add(-params.learning_rate, &grad_coef);
            intercept.scaled_add(-params.learning_rate, &grad_intercept);
        }

        Ok(LogisticRegression {
            classes,
            coef,
            intercept,
            mean,
            scale,
        })
    }

    /// Shapes of the fitted arrays must agree with each other.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        let (k, features) = self.coef.dim();
        if k != self.classes.len() || self.intercept.len() != k {
            return Err(ModelError::Inconsistent(format!(
                "{} classes, coef rows {}, intercept length {}",
                self.classes.len(),
                k,
                self.intercept.len()
            )));
        }
        if self.mean.len() != features || self.scale.len() != features {
            return Err(ModelError::Inconsistent(format!(
                "coef columns {}, mean length {}, scale length {}",
                features,
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    pub fn predict_proba(&self, rows: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        if rows.ncols() != self.n_features() {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features(),
                got: rows.ncols(),
            });
        }
        let z = (&rows - &self.mean) / &self.scale;
        let mut probs = z.dot(&self.coef.t()) + &self.intercept;
        softmax_rows(&mut probs);
        Ok(probs)
    }

    pub fn predict(&self, rows: ArrayView2<f64>) -> Result<Array1<i64>, ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::NoClasses);
        }
        let probs = self.predict_proba(rows)?;
        Ok(probs
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (idx, &p)| {
                        if p > acc.1 {
                            (idx, p)
                        } else {
                            acc
                        }
                    })
                    .0;
                self.classes[best]
            })
            .collect())
    }
}
