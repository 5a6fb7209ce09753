//! Iris training pipeline CLI
//!
//! Fits the estimators the prediction API serves and reports their accuracy.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use backend::estimators::{ForestParams, LogisticParams};
use backend::Estimator;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use training::dataset::TARGET_NAMES;
use training::{evaluate, load_csv, load_dataset, split_data, train_forest, train_logistic, Dataset};

#[derive(Parser)]
#[command(name = "iris-pipeline")]
#[command(about = "Train and evaluate iris classifiers", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Logistic,
    Forest,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model on a train split, score it on the held-out split and save it
    Train {
        #[arg(long, value_enum, default_value = "logistic")]
        kind: Kind,
        /// Where to write the JSON artefact
        #[arg(short, long)]
        output: PathBuf,
        /// CSV with the bundled column layout instead of the built-in data
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value = "0.2")]
        test_size: f64,
        /// Seed for the split and the forest's bootstrap
        #[arg(long)]
        seed: Option<u64>,
        /// Gradient descent iterations (logistic)
        #[arg(long, default_value = "1000")]
        max_iter: usize,
        /// Number of trees (forest)
        #[arg(long, default_value = "100")]
        n_estimators: usize,
    },
    /// Score a saved artefact against a dataset
    Evaluate {
        #[arg(short, long)]
        model: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn dataset(path: Option<&PathBuf>) -> anyhow::Result<Dataset> {
    match path {
        Some(path) => load_csv(path).with_context(|| format!("failed to load {}", path.display())),
        None => Ok(load_dataset()?),
    }
}

/// Label names are only known for the built-in data.
fn class_legend(path: Option<&PathBuf>) -> Option<String> {
    match path {
        Some(_) => None,
        None => Some(format!("Classes: {}", TARGET_NAMES.join(", "))),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    match cli.command {
        Commands::Train {
            kind,
            output,
            data,
            test_size,
            seed,
            max_iter,
            n_estimators,
        } => {
            let legend = class_legend(data.as_ref());
            let data = dataset(data.as_ref())?;
            let (train, test) = split_data(&data, test_size, seed)?;
            info!(
                "Training on {} rows, holding out {} for evaluation",
                train.len(),
                test.len()
            );

            let model = match kind {
                Kind::Logistic => train_logistic(
                    &train,
                    &LogisticParams {
                        max_iter,
                        ..LogisticParams::default()
                    },
                )?,
                Kind::Forest => train_forest(
                    &train,
                    &ForestParams {
                        n_estimators,
                        seed,
                        ..ForestParams::default()
                    },
                )?,
            };

            let report = evaluate(&model, &test)?;
            println!("{}", report);
            if let Some(legend) = legend {
                println!("{}", legend);
            }

            model
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("Saved {} model to {}", model.kind(), output.display());
        }
        Commands::Evaluate { model, data } => {
            let bytes = fs::read(&model).with_context(|| format!("failed to read {}", model.display()))?;
            let estimator = Estimator::from_slice(&bytes)
                .with_context(|| format!("{} is not a model artefact", model.display()))?;
            estimator
                .validate()
                .with_context(|| format!("{} is inconsistent", model.display()))?;
            let data = dataset(data.as_ref())?;
            info!("Evaluating {} model on {} rows", estimator.kind(), data.len());
            println!("{}", evaluate(&estimator, &data)?);
        }
    }

    Ok(())
}
