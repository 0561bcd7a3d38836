//! Periodic status sampling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::pipeline::PipelineStatus;
use crate::shared::SharedPipeline;

/// Status ticker configuration.
#[derive(Debug, Clone)]
pub struct StatusTickerConfig {
    /// Sampling interval. The default of five seconds is what the traffic
    /// statistics' EWMA decay constants are derived for; change it only
    /// together with those.
    pub interval: Duration,
}

impl Default for StatusTickerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Samples a pipeline's status on a fixed cadence.
///
/// Each tick takes one [`SharedPipeline::status`] snapshot (which drives
/// the EWMA tick and reservoir drain inside stat-carrying filters) and
/// publishes it on a watch channel. The task stops when every receiver is
/// gone.
pub struct StatusTicker {
    pipeline: Arc<SharedPipeline>,
    config: StatusTickerConfig,
    tx: watch::Sender<PipelineStatus>,
}

impl StatusTicker {
    /// Creates a ticker and the receiver for its snapshots.
    pub fn new(
        pipeline: Arc<SharedPipeline>,
        config: StatusTickerConfig,
    ) -> (Self, watch::Receiver<PipelineStatus>) {
        let (tx, rx) = watch::channel(PipelineStatus::default());
        (
            Self {
                pipeline,
                config,
                tx,
            },
            rx,
        )
    }

    /// Starts the sampling task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let status = self.pipeline.status();
            debug!(
                pipeline = %self.pipeline.current().name(),
                filters = status.filters.len(),
                "status sampled"
            );

            if self.tx.send(status).is_err() {
                // No receivers left.
                break;
            }
        }
    }
}
