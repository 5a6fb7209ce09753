use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

pub const LOGISTIC_MODEL: &str = "logistic_model";
pub const RF_MODEL: &str = "rf_model";

/// A servable model name and where its artefact lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSource {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub api_key: Option<String>,
    pub models: Vec<ModelSource>,
    pub log_delay: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("API_KEY").ok().filter(|key| !key.is_empty());

        AppConfig {
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 8000),
            workers: env_parse("WORKERS", num_cpus::get()).max(1),
            api_key,
            models: vec![
                ModelSource {
                    name: LOGISTIC_MODEL.to_string(),
                    path: PathBuf::from(env_or("LOGISTIC_MODEL", "models/logistic_model.json")),
                },
                ModelSource {
                    name: RF_MODEL.to_string(),
                    path: PathBuf::from(env_or("RF_MODEL", "models/rf_model.json")),
                },
            ],
            log_delay: Duration::from_millis(env_parse("PREDICTION_LOG_DELAY_MS", 5000)),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so env mutation does not race with itself.
    #[test]
    fn reads_environment_with_fallbacks() {
        env::set_var("PORT", "not-a-port");
        env::set_var("RF_MODEL", "/srv/models/forest.json");
        env::set_var("API_KEY", "");
        env::set_var("PREDICTION_LOG_DELAY_MS", "250");

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.log_delay, Duration::from_millis(250));
        assert_eq!(cfg.model_names(), vec![LOGISTIC_MODEL, RF_MODEL]);
        assert_eq!(cfg.models[1].path, PathBuf::from("/srv/models/forest.json"));
        assert!(cfg.workers >= 1);

        env::set_var("API_KEY", "mysecureapikey123");
        assert_eq!(AppConfig::from_env().api_key.as_deref(), Some("mysecureapikey123"));

        for key in ["PORT", "RF_MODEL", "API_KEY", "PREDICTION_LOG_DELAY_MS"] {
            env::remove_var(key);
        }
    }
}
