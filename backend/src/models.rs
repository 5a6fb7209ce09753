use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::FieldIssue;

/// Exclusive bounds shared by every measurement.
pub const FEATURE_MIN: f64 = 0.0;
pub const FEATURE_MAX: f64 = 10.0;

/// Number of columns a classifier receives per row.
pub const FEATURE_COUNT: usize = 4;

fn default_sepal_length() -> f64 {
    1.1
}

fn default_sepal_width() -> f64 {
    3.1
}

fn default_petal_length() -> f64 {
    2.1
}

fn default_petal_width() -> f64 {
    4.1
}

/// Flower measurements in centimetres, as posted to the predict routes.
///
/// Absent fields take their defaults; a field that is present must still
/// deserialize as a number, so `null` or a string is rejected.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PredictionInput {
    #[serde(default = "default_sepal_length")]
    pub sepal_length: f64,
    #[serde(default = "default_sepal_width")]
    pub sepal_width: f64,
    #[serde(default = "default_petal_length")]
    pub petal_length: f64,
    #[serde(default = "default_petal_width")]
    pub petal_width: f64,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            sepal_length: default_sepal_length(),
            sepal_width: default_sepal_width(),
            petal_length: default_petal_length(),
            petal_width: default_petal_width(),
        }
    }
}

impl PredictionInput {
    fn named_features(&self) -> [(&'static str, f64); FEATURE_COUNT] {
        [
            ("sepal_length", self.sepal_length),
            ("sepal_width", self.sepal_width),
            ("petal_length", self.petal_length),
            ("petal_width", self.petal_width),
        ]
    }

    /// Checks every field against the open interval (0, 10) and reports all
    /// offending fields at once.
    pub fn validate(&self) -> Result<(), Vec<FieldIssue>> {
        let issues: Vec<FieldIssue> = self
            .named_features()
            .iter()
            .filter_map(|(name, value)| {
                if !value.is_finite() {
                    Some(FieldIssue::body(name, "Input should be a finite number", "finite_number"))
                } else if *value <= FEATURE_MIN {
                    Some(FieldIssue::body(
                        name,
                        &format!("Input should be greater than {}", FEATURE_MIN),
                        "greater_than",
                    ))
                } else if *value >= FEATURE_MAX {
                    Some(FieldIssue::body(
                        name,
                        &format!("Input should be less than {}", FEATURE_MAX),
                        "less_than",
                    ))
                } else {
                    None
                }
            })
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }

    /// Single-row matrix in the column order the classifiers were trained on.
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, col)| self.to_array()[col])
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub model: String,
    pub prediction: i64,
}

/// What the deferred logger writes once per successful prediction.
///
/// `prediction` is the classifier's whole output vector, while the response
/// only carries its first element.
#[derive(Debug, Serialize, Clone)]
pub struct LogRecord {
    pub model: String,
    pub features: PredictionInput,
    pub prediction: Vec<i64>,
    pub logged_at: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(model: &str, features: PredictionInput, prediction: Vec<i64>) -> Self {
        LogRecord {
            model: model.to_string(),
            features,
            prediction,
            logged_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub available_models: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_take_defaults() {
        let input: PredictionInput = serde_json::from_str(r#"{"sepal_length": 5.1}"#).unwrap();
        assert_eq!(input.sepal_length, 5.1);
        assert_eq!(input.sepal_width, 3.1);
        assert_eq!(input.petal_length, 2.1);
        assert_eq!(input.petal_width, 4.1);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn null_field_is_not_defaulted() {
        let parsed = serde_json::from_str::<PredictionInput>(r#"{"sepal_length": null}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn bounds_are_exclusive() {
        let input = PredictionInput {
            sepal_length: 0.0,
            sepal_width: 10.0,
            petal_length: 9.99,
            petal_width: 0.01,
        };
        let issues = input.validate().unwrap_err();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].loc, vec!["body", "sepal_length"]);
        assert_eq!(issues[0].kind, "greater_than");
        assert_eq!(issues[1].loc, vec!["body", "sepal_width"]);
        assert_eq!(issues[1].kind, "less_than");
    }

    #[test]
    fn row_keeps_training_column_order() {
        let input = PredictionInput {
            sepal_length: 5.1,
            sepal_width: 3.5,
            petal_length: 1.4,
            petal_width: 0.2,
        };
        let row = input.to_row();
        assert_eq!(row.shape(), &[1, 4]);
        assert_eq!(row.row(0).to_vec(), vec![5.1, 3.5, 1.4, 0.2]);
    }
}
