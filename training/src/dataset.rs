use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use thiserror::Error;

/// Fisher's Iris measurements, class ids 0 = setosa, 1 = versicolor, 2 = virginica.
pub const IRIS_CSV: &str = include_str!("../data/iris.csv");

pub const TARGET_NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("dataset has no rows")]
    Empty,

    #[error("test size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),
}

#[derive(Debug, Deserialize)]
struct IrisRow {
    sepal_length: f64,
    sepal_width: f64,
    petal_length: f64,
    petal_width: f64,
    target: i64,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub targets: Array1<i64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
        }
    }
}

fn from_reader<R: Read>(reader: R) -> Result<Dataset, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    let mut targets = Vec::new();
    for result in rdr.deserialize() {
        let row: IrisRow = result?;
        values.extend_from_slice(&[
            row.sepal_length,
            row.sepal_width,
            row.petal_length,
            row.petal_width,
        ]);
        targets.push(row.target);
    }

    if targets.is_empty() {
        return Err(DatasetError::Empty);
    }

    Ok(Dataset {
        features: Array2::from_shape_vec((targets.len(), 4), values)?,
        targets: Array1::from(targets),
    })
}

/// The bundled Iris data.
pub fn load_dataset() -> Result<Dataset, DatasetError> {
    from_reader(IRIS_CSV.as_bytes())
}

/// Same column layout as the bundled file, header included.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    from_reader(File::open(path)?)
}

/// Shuffled train/test split; the test part holds `ceil(n * test_size)` rows.
pub fn split_data(
    data: &Dataset,
    test_size: f64,
    seed: Option<u64>,
) -> Result<(Dataset, Dataset), DatasetError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::InvalidTestSize(test_size));
    }
    if data.is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut indices: Vec<usize> = (0..data.len()).collect();
    indices.shuffle(&mut rng);

    let n_test = ((data.len() as f64) * test_size).ceil() as usize;
    let n_test = n_test.clamp(1, data.len().saturating_sub(1).max(1));
    let (test, train) = indices.split_at(n_test);
    Ok((data.select(train), data.select(test)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dataset_is_balanced() {
        let data = load_dataset().unwrap();
        assert_eq!(data.features.dim(), (150, 4));
        for class in 0..3 {
            assert_eq!(data.targets.iter().filter(|&&t| t == class).count(), 50);
        }
    }

    #[test]
    fn split_is_eighty_twenty() {
        let data = load_dataset().unwrap();
        let (train, test) = split_data(&data, 0.2, Some(42)).unwrap();
        assert_eq!(train.len(), 120);
        assert_eq!(test.len(), 30);
    }

    #[test]
    fn seeded_split_is_reproducible() {
        let data = load_dataset().unwrap();
        let (_, a) = split_data(&data, 0.2, Some(1)).unwrap();
        let (_, b) = split_data(&data, 0.2, Some(1)).unwrap();
        assert_eq!(a.targets, b.targets);
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn rejects_bad_test_size() {
        let data = load_dataset().unwrap();
        assert!(matches!(
            split_data(&data, 1.5, None),
            Err(DatasetError::InvalidTestSize(_))
        ));
    }

    #[test]
    fn header_only_csv_is_empty() {
        let err = from_reader("sepal_length,sepal_width,petal_length,petal_width,target\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }
}
