use crate::config::AppConfig;
use crate::logging::PredictionLogger;
use crate::registry::ModelRegistry;

/// Everything a request handler needs, shared through `web::Data`.
pub struct AppState {
    pub registry: ModelRegistry,
    /// Names a request may ask for; the registry decides whether each is loaded.
    pub model_names: Vec<String>,
    pub api_key: Option<String>,
    pub logger: PredictionLogger,
}

impl AppState {
    pub fn new(
        registry: ModelRegistry,
        model_names: Vec<String>,
        api_key: Option<String>,
        logger: PredictionLogger,
    ) -> Self {
        AppState {
            registry,
            model_names,
            api_key,
            logger,
        }
    }

    /// Populates the registry from every configured source. The first
    /// failure aborts startup.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, crate::error::RegistryError> {
        let registry = ModelRegistry::new();
        for source in &cfg.models {
            registry.load(&source.name, &source.path)?;
        }
        Ok(AppState::new(
            registry,
            cfg.model_names(),
            cfg.api_key.clone(),
            PredictionLogger::new(cfg.log_delay),
        ))
    }

    pub fn is_known_model(&self, name: &str) -> bool {
        self.model_names.iter().any(|known| known == name)
    }
}
