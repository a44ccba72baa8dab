use std::sync::Arc;

use anyhow::Result;
use tokio::time::{self, Duration as TokioDuration};
use tracing::{info, warn};

use crate::config;

use super::adapters::{DebtLedger, EnrollmentLookup, StudentDirectory};
use super::period::Clock;
use super::reconciliation::ReconciliationEngine;

/// key: billing-scheduler -> periodic debt generation
///
/// The original system drives generation from a scheduled console command;
/// here a background task re-runs the idempotent batch on an interval, so a
/// restart mid-month only produces skips.
pub fn spawn<S, C>(engine: Arc<ReconciliationEngine<S, C>>)
where
    S: StudentDirectory + EnrollmentLookup + DebtLedger + 'static,
    C: Clock + 'static,
{
    let interval = TokioDuration::from_secs(*config::BILLING_GENERATION_SCAN_INTERVAL_SECS);

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = process_tick(&engine).await {
                warn!(?err, "debt generation tick failed");
            }
        }
    });
}

/// key: billing-scheduler -> tick handler
pub async fn process_tick<S, C>(engine: &ReconciliationEngine<S, C>) -> Result<()>
where
    S: StudentDirectory + EnrollmentLookup + DebtLedger,
    C: Clock,
{
    let report = engine.generate_for_current_period().await?;
    info!(
        run = %report.run,
        period = %report.period,
        created = report.created(),
        skipped = report.skipped(),
        failed = report.failed(),
        "debt generation tick finished"
    );
    if report.failed() > 0 {
        warn!(
            run = %report.run,
            period = %report.period,
            failed = report.failed(),
            "debt generation completed with failures"
        );
    }
    Ok(())
}
