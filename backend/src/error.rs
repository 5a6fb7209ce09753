use std::path::PathBuf;

use actix_web::error::{BlockingError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One entry of a 422 body, shaped like the FastAPI `detail` list.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldIssue {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldIssue {
    pub fn body(field: &str, msg: &str, kind: &str) -> Self {
        FieldIssue {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.to_string(),
            kind: kind.to_string(),
        }
    }

    pub fn path(field: &str, msg: &str, kind: &str) -> Self {
        FieldIssue {
            loc: vec!["path".to_string(), field.to_string()],
            msg: msg.to_string(),
            kind: kind.to_string(),
        }
    }

    pub fn unknown_model(name: &str, allowed: &[String]) -> Self {
        FieldIssue::path(
            "model_name",
            &format!(
                "'{}' is not one of the configured models: {}",
                name,
                allowed.join(", ")
            ),
            "enum",
        )
    }
}

/// Failures raised by the estimators themselves.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected {expected} features per row, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("got {rows} rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("model has no classes")]
    NoClasses,

    #[error("model returned no predictions")]
    EmptyOutput,

    #[error("inconsistent model: {0}")]
    Inconsistent(String),
}

/// Startup failures while populating the registry. Fatal for the server.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read model '{name}' from {}: {source}", .path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode model '{name}' from {}: {source}", .path.display())]
    Decode {
        name: String,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model '{name}' from {} is invalid: {source}", .path.display())]
    Invalid {
        name: String,
        path: PathBuf,
        #[source]
        source: ModelError,
    },
}

/// Every request-time failure, rendered into a response by actix.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(Vec<FieldIssue>),

    #[error("Model not found")]
    ModelNotFound,

    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("Not Found")]
    RouteNotFound,

    #[error("prediction failed: {0}")]
    Prediction(#[from] ModelError),

    #[error("blocking executor failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Prediction(_) | ApiError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            ApiError::Validation(issues) => json!(issues),
            // Internals stay in the server log.
            ApiError::Prediction(_) | ApiError::Blocking(_) => json!("Internal Server Error"),
            other => json!(other.to_string()),
        };
        HttpResponse::build(self.status_code()).json(json!({ "detail": detail }))
    }
}

/// Maps JSON extractor failures (bad syntax, wrong types, `null`, wrong
/// content type) to a 422. Size limits and transport errors keep actix's status.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let kind = match &err {
        JsonPayloadError::Deserialize(inner) if inner.is_syntax() || inner.is_eof() => "json_invalid",
        JsonPayloadError::Deserialize(_) => "model_attributes_type",
        JsonPayloadError::ContentType => "content_type",
        _ => return err.into(),
    };
    let msg = match &err {
        JsonPayloadError::Deserialize(inner) => inner.to_string(),
        other => other.to_string(),
    };
    ApiError::Validation(vec![FieldIssue {
        loc: vec!["body".to_string()],
        msg,
        kind: kind.to_string(),
    }])
    .into()
}
