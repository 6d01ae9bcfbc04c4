//! Event Worker

use crate::engine::DischargeEngine;
use crate::outcome::ProcessOutcome;
use crate::reading::ReadingEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Counters reported by a worker when its channel closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    pub processed: usize,
    pub calculated: usize,
    pub no_curve: usize,
    pub failed: usize,
}

impl WorkerStats {
    fn record(&mut self, outcome: &ProcessOutcome) {
        self.processed += 1;
        match outcome {
            ProcessOutcome::Calculated(_) => self.calculated += 1,
            ProcessOutcome::NoCurve => self.no_curve += 1,
            ProcessOutcome::Failed(_) => self.failed += 1,
            _ => {}
        }
    }
}

/// Single consumer draining reading events into the engine.
///
/// Hosts that prefer a writer queue over in-process callbacks send
/// events through the channel; the worker applies them strictly in
/// arrival order, which makes the per-reading locks uncontended.
pub struct DischargeWorker {
    receiver: mpsc::Receiver<ReadingEvent>,
    engine: Arc<DischargeEngine>,
}

impl DischargeWorker {
    pub fn new(receiver: mpsc::Receiver<ReadingEvent>, engine: Arc<DischargeEngine>) -> Self {
        info!("Creating discharge worker");
        Self { receiver, engine }
    }

    /// Create a sender/worker pair; the channel capacity comes from
    /// the engine's `queue_capacity`.
    pub fn channel(engine: Arc<DischargeEngine>) -> (mpsc::Sender<ReadingEvent>, Self) {
        let capacity = engine.config().queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx, engine))
    }

    /// Drain events until every sender is dropped, then report totals.
    pub async fn run(mut self) -> WorkerStats {
        info!("Starting discharge worker");
        let mut stats = WorkerStats::default();

        while let Some(event) = self.receiver.recv().await {
            let outcome = self.engine.handle(&event);
            debug!("Worker handled event: {:?}", outcome);
            stats.record(&outcome);
        }

        info!(
            "Discharge worker stopped: {} events, {} calculated, {} without curve, {} failed",
            stats.processed, stats.calculated, stats.no_curve, stats.failed
        );
        stats
    }
}
