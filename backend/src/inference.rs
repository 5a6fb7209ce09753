use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::estimators::{LogisticRegression, RandomForest};

/// Anything the registry can serve. Output holds one label per input row.
pub trait Classifier: Send + Sync {
    fn predict(&self, rows: ArrayView2<f64>) -> Result<Array1<i64>, ModelError>;
}

/// On-disk model artefact, tagged by estimator kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Estimator {
    Logistic(LogisticRegression),
    RandomForest(RandomForest),
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Logistic(_) => "logistic",
            Estimator::RandomForest(_) => "random_forest",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Estimator::Logistic(model) => model.n_features(),
            Estimator::RandomForest(model) => model.n_features,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Estimator::Logistic(model) => model.validate(),
            Estimator::RandomForest(model) => model.validate(),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Writes the artefact as pretty JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        writer.into_inner()?.sync_all()
    }
}

impl Classifier for Estimator {
    fn predict(&self, rows: ArrayView2<f64>) -> Result<Array1<i64>, ModelError> {
        match self {
            Estimator::Logistic(model) => model.predict(rows),
            Estimator::RandomForest(model) => model.predict(rows),
        }
    }
}
