//! Offline side of the iris service: dataset loading, train/test split,
//! fitting the served estimators and scoring them.

pub mod dataset;
pub mod metrics;

use backend::estimators::{ForestParams, LogisticParams, LogisticRegression, RandomForest};
use backend::{Estimator, ModelError};

pub use dataset::{load_csv, load_dataset, split_data, Dataset, DatasetError};
pub use metrics::{accuracy, confusion_matrix, evaluate, Evaluation};

pub fn train_logistic(train: &Dataset, params: &LogisticParams) -> Result<Estimator, ModelError> {
    let model = LogisticRegression::fit(train.features.view(), train.targets.view(), params)?;
    Ok(Estimator::Logistic(model))
}

pub fn train_forest(train: &Dataset, params: &ForestParams) -> Result<Estimator, ModelError> {
    let model = RandomForest::fit(train.features.view(), train.targets.view(), params)?;
    Ok(Estimator::RandomForest(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::Classifier;

    #[test]
    fn logistic_model_accuracy() {
        let data = load_dataset().unwrap();
        let (train, test) = split_data(&data, 0.2, Some(42)).unwrap();
        let model = train_logistic(&train, &LogisticParams::default()).unwrap();
        let report = evaluate(&model, &test).unwrap();
        assert!(report.accuracy > 0.8, "Model accuracy is below 80%: {}", report.accuracy);
    }

    #[test]
    fn forest_model_accuracy() {
        let data = load_dataset().unwrap();
        let (train, test) = split_data(&data, 0.2, Some(42)).unwrap();
        let params = ForestParams {
            n_estimators: 30,
            seed: Some(42),
            ..ForestParams::default()
        };
        let model = train_forest(&train, &params).unwrap();
        let report = evaluate(&model, &test).unwrap();
        assert!(report.accuracy > 0.8, "Model accuracy is below 80%: {}", report.accuracy);
    }

    #[test]
    fn trained_model_accepts_a_single_request_row() {
        let data = load_dataset().unwrap();
        let model = train_logistic(&data, &LogisticParams::default()).unwrap();
        let row = ndarray::array![[5.1, 3.5, 1.4, 0.2]];
        assert_eq!(model.predict(row.view()).unwrap().to_vec(), vec![0]);
    }
}
