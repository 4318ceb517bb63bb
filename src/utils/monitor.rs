use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed: Duration,
}

/// Per-request stage timer. Cloning shares the recorded timings.
#[derive(Debug, Clone)]
pub struct StageMonitor {
    start_time: Instant,
    stages: Arc<Mutex<Vec<StageTiming>>>,
    enabled: bool,
}

impl StageMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            start_time: Instant::now(),
            stages: Arc::new(Mutex::new(Vec::new())),
            enabled,
        }
    }

    pub fn record(&self, stage: &str, started: Instant) {
        if !self.enabled {
            return;
        }

        let elapsed = started.elapsed();
        tracing::info!("⏱️ {} - {:?}", stage, elapsed);

        if let Ok(mut stages) = self.stages.lock() {
            stages.push(StageTiming {
                stage: stage.to_string(),
                elapsed,
            });
        }
    }

    pub fn timings(&self) -> Vec<StageTiming> {
        self.stages
            .lock()
            .map(|stages| stages.clone())
            .unwrap_or_default()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }

        let timings = self.timings();
        let summary: Vec<String> = timings
            .iter()
            .map(|t| format!("{}={}ms", t.stage, t.elapsed.as_millis()))
            .collect();
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Stages: [{}]",
            self.total_elapsed(),
            summary.join(", ")
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for StageMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
