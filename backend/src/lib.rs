//! Iris classifier serving: model registry, request validation, API-key guard
//! and deferred prediction logging on top of actix-web.

pub mod auth;
pub mod config;
pub mod error;
pub mod estimators;
pub mod inference;
pub mod logging;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ModelError, RegistryError};
pub use inference::{Classifier, Estimator};
pub use registry::ModelRegistry;
pub use state::AppState;
