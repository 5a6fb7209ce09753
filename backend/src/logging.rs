use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::rt;
use log::{info, warn};

use crate::models::LogRecord;

/// Fire-and-forget prediction log.
///
/// Each record gets its own task on the worker's executor: no ordering between
/// records, no retry, and whatever is still sleeping at shutdown is dropped.
#[derive(Clone, Debug)]
pub struct PredictionLogger {
    delay: Duration,
    written: Arc<AtomicU64>,
}

impl PredictionLogger {
    pub fn new(delay: Duration) -> Self {
        PredictionLogger {
            delay,
            written: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records written so far.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Must be called from inside the actix runtime.
    pub fn schedule(&self, record: LogRecord) -> rt::task::JoinHandle<()> {
        let delay = self.delay;
        let written = Arc::clone(&self.written);

        rt::spawn(async move {
            // Stand-in for a slow sink.
            rt::time::sleep(delay).await;

            match serde_json::to_string(&record) {
                Ok(line) => {
                    info!("Logging prediction: {}", line);
                    written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => warn!("Dropped prediction log for '{}': {}", record.model, e),
            }
        })
    }
}
