use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::{error, info, warn};

use backend::{routes, AppConfig, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("🚀 Starting iris prediction API");

    let cfg = AppConfig::from_env();
    if cfg.api_key.is_none() {
        warn!("API_KEY is not set: every /predict_secure request will be rejected");
    }

    let state = match AppState::from_config(&cfg) {
        Ok(state) => state,
        Err(e) => {
            error!("❌ {}", e);
            return Err(e).context("cannot serve without every configured model");
        }
    };
    let state = web::Data::new(state);

    let bind_address = cfg.bind_address();
    info!("🌐 Listening on http://{}", bind_address);
    info!("👷 Workers: {}", cfg.workers);
    info!("📦 Models: {}", state.registry.list().join(", "));
    info!("⏱️  Prediction log delay: {:?}", state.logger.delay());

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .workers(cfg.workers)
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run()
    .await?;

    state.registry.clear();
    info!(
        "👋 Shut down after writing {} prediction log(s)",
        state.logger.written()
    );
    Ok(())
}
