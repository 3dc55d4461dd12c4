use std::{sync::Arc, time::Duration};

use tracing::{debug, instrument, warn};

use super::{ScanEngine, ScanOutcome};
use crate::config::ScanConfig;

/// Drives one scan invocation end to end: injection assurance, the bounded
/// engine call, and classification of whatever came back.
///
/// The driver holds no mutable state, so one instance can serve concurrent
/// invocations; the only shared resource is the target context behind the
/// engine, which `inject` is required to treat idempotently.
pub struct ScanDriver<E: ScanEngine> {
    engine: Arc<E>,
}

impl<E: ScanEngine> ScanDriver<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Run the scan described by `config` and classify the result.
    ///
    /// Every failure mode is folded into a [`ScanOutcome`] variant; this
    /// method never errors and never retries.
    #[instrument(
        name = "run_scan",
        skip(self, config),
        fields(context = %config.context, timeout_ms = config.options.timeout_ms)
    )]
    pub async fn run_scan(&self, config: &ScanConfig) -> ScanOutcome {
        match self.engine.inject().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("engine script absent after injection assurance");
                return ScanOutcome::EngineMissing;
            }
            Err(err) => {
                return ScanOutcome::EngineError {
                    message: format!("{err:#}"),
                }
            }
        }

        let budget = Duration::from_millis(config.options.timeout_ms);
        let call = self.engine.run(&config.context, &config.options);
        match tokio::time::timeout(budget, call).await {
            Err(_) => {
                warn!(budget_ms = config.options.timeout_ms, "scan timed out");
                ScanOutcome::TimedOut
            }
            Ok(Err(err)) => ScanOutcome::EngineError {
                message: format!("{err:#}"),
            },
            Ok(Ok(results)) => match results.into_outcome() {
                Ok(outcome) => outcome,
                Err(err) => ScanOutcome::EngineError {
                    message: format!("{err:#}"),
                },
            },
        }
    }
}
