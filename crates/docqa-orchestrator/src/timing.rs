use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use docqa_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Decision,
    Retrieval,
    Synthesis,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Decision => "decision",
            Stage::Retrieval => "retrieval",
            Stage::Synthesis => "synthesis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
    pub succeeded: bool,
}

/// Run `fut`, recording how long it took and whether it succeeded.
pub async fn timed<T>(stage: Stage, fut: impl Future<Output = Result<T>>) -> (Result<T>, StageTiming) {
    let start = Instant::now();
    let result = fut.await;
    let timing = StageTiming { stage, elapsed: start.elapsed(), succeeded: result.is_ok() };
    tracing::info!(stage = stage.as_str(), elapsed_ms = timing.elapsed.as_millis() as u64, ok = timing.succeeded, "stage finished");
    (result, timing)
}
