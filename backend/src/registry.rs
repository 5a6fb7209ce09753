use std::fs;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use log::info;

use crate::error::RegistryError;
use crate::inference::{Classifier, Estimator};

/// Named models held for the life of the server.
///
/// Filled at startup and cleared at shutdown; request handlers only read.
#[derive(Default)]
pub struct ModelRegistry {
    models: DashMap<String, Arc<dyn Classifier>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and decodes the artefact at `path`, then registers it as `name`.
    pub fn load<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| RegistryError::Io {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        let estimator = Estimator::from_slice(&bytes).map_err(|source| RegistryError::Decode {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        estimator.validate().map_err(|source| RegistryError::Invalid {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "Loaded model '{}' ({}, {} features) from {}",
            name,
            estimator.kind(),
            estimator.n_features(),
            path.display()
        );
        self.insert(name, Arc::new(estimator));
        Ok(())
    }

    pub fn insert(&self, name: &str, model: Arc<dyn Classifier>) {
        self.models.insert(name.to_string(), model);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Classifier>> {
        self.models.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Loaded names in ascending order.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn clear(&self) {
        let released = self.models.len();
        self.models.clear();
        info!("Released {} model(s)", released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use ndarray::{Array1, ArrayView2};
    use std::path::PathBuf;

    struct Constant(i64);

    impl Classifier for Constant {
        fn predict(&self, rows: ArrayView2<f64>) -> Result<Array1<i64>, ModelError> {
            Ok(Array1::from_elem(rows.nrows(), self.0))
        }
    }

    fn scratch_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("iris-registry-{}-{}.json", tag, std::process::id()))
    }

    #[test]
    fn list_is_sorted_and_clear_empties() {
        let registry = ModelRegistry::new();
        registry.insert("rf_model", Arc::new(Constant(2)));
        registry.insert("logistic_model", Arc::new(Constant(1)));
        assert_eq!(registry.list(), vec!["logistic_model", "rf_model"]);
        assert!(registry.contains("rf_model"));

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("rf_model").is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let registry = ModelRegistry::new();
        let err = registry
            .load("logistic_model", "/nonexistent/logistic_model.json")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let path = scratch_file("corrupt");
        fs::write(&path, b"not a model").unwrap();
        let registry = ModelRegistry::new();
        let err = registry.load("rf_model", &path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, RegistryError::Decode { .. }));
    }

    #[test]
    fn inconsistent_artefact_is_rejected_at_load() {
        let path = scratch_file("inconsistent");
        fs::write(
            &path,
            br#"{"kind":"random_forest","params":{"classes":[0,1,2],"n_features":4,"trees":[{"leaf":{"class":7}}]}}"#,
        )
        .unwrap();
        let registry = ModelRegistry::new();
        let err = registry.load("rf_model", &path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, RegistryError::Invalid { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn loads_saved_artefact() {
        use crate::estimators::{LogisticParams, LogisticRegression};
        use ndarray::array;

        let x = array![[1.0, 1.0], [1.2, 0.8], [6.0, 6.0], [6.1, 5.8]];
        let y = array![0, 0, 1, 1];
        let model = LogisticRegression::fit(x.view(), y.view(), &LogisticParams::default()).unwrap();
        let path = scratch_file("saved");
        Estimator::Logistic(model).save(&path).unwrap();

        let registry = ModelRegistry::new();
        registry.load("logistic_model", &path).unwrap();
        fs::remove_file(&path).ok();

        let loaded = registry.get("logistic_model").unwrap();
        assert_eq!(loaded.predict(array![[6.0, 6.0]].view()).unwrap().to_vec(), vec![1]);
    }
}
