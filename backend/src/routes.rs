use actix_web::dev::Service;
use actix_web::{get, post, web, HttpResponse, Responder};
use log::{debug, error};

use crate::auth;
use crate::error::{json_error_handler, ApiError, FieldIssue, ModelError};
use crate::models::{
    HealthResponse, LogRecord, MessageResponse, ModelsResponse, PredictionInput, PredictionResult,
};
use crate::state::AppState;

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        message: "Hello World".to_string(),
    })
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
    })
}

#[get("/models")]
pub async fn list_models(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ModelsResponse {
        available_models: state.registry.list(),
    })
}

/// Shared body of both predict routes: validate, resolve, predict, then hand
/// the log record off without waiting for it.
pub async fn run_prediction(
    state: &AppState,
    model_name: &str,
    input: PredictionInput,
) -> Result<PredictionResult, ApiError> {
    let mut issues = Vec::new();
    if !state.is_known_model(model_name) {
        issues.push(FieldIssue::unknown_model(model_name, &state.model_names));
    }
    if let Err(mut bad) = input.validate() {
        issues.append(&mut bad);
    }
    if !issues.is_empty() {
        debug!("Rejected prediction request for '{}': {} issue(s)", model_name, issues.len());
        return Err(ApiError::Validation(issues));
    }

    let model = state.registry.get(model_name).ok_or(ApiError::ModelNotFound)?;
    let row = input.to_row();

    let output = web::block(move || model.predict(row.view()))
        .await
        .map_err(ApiError::from)
        .and_then(|result| result.map_err(ApiError::from))
        .inspect_err(|e| error!("Prediction with '{}' failed: {}", model_name, e))?;

    let prediction = match output.first() {
        Some(label) => *label,
        None => {
            error!("Model '{}' returned an empty output", model_name);
            return Err(ModelError::EmptyOutput.into());
        }
    };

    state
        .logger
        .schedule(LogRecord::new(model_name, input, output.to_vec()));

    Ok(PredictionResult {
        model: model_name.to_string(),
        prediction,
    })
}

#[post("/predict/{model_name}")]
pub async fn predict(
    state: web::Data<AppState>,
    model_name: web::Path<String>,
    input: web::Json<PredictionInput>,
) -> Result<HttpResponse, ApiError> {
    let result = run_prediction(&state, &model_name, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Mounted under the API-key guarded scope.
#[post("/{model_name}")]
pub async fn predict_secure(
    state: web::Data<AppState>,
    model_name: web::Path<String>,
    input: web::Json<PredictionInput>,
) -> Result<HttpResponse, ApiError> {
    let result = run_prediction(&state, &model_name, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::RouteNotFound)
}

/// Registers every route. Expects `web::Data<AppState>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(root)
        .service(health_check)
        .service(list_models)
        .service(predict)
        .service(
            web::scope("/predict_secure")
                .wrap_fn(|req, srv| {
                    let fut = match auth::authorize(&req) {
                        Ok(()) => Ok(srv.call(req)),
                        Err(e) => Err(req.error_response(e)),
                    };
                    async move {
                        match fut {
                            Ok(fut) => fut.await.map(|res| res.map_into_boxed_body()),
                            Err(rejected) => Ok(rejected),
                        }
                    }
                })
                .service(predict_secure),
        )
        .default_service(web::route().to(not_found));
}
