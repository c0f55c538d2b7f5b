//! Background driver for webhook dispatch.
//!
//! Two loops: the retry sweep, ticking [`Dispatcher::process_pending_retries`]
//! on a fixed cadence, and the event loop draining the publisher's
//! broadcast channel into [`Dispatcher::dispatch`]. The dispatcher
//! itself holds no timers; this worker is its only internal scheduler,
//! and an external cron invoking the sweep works just as well.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::services::dispatcher::Dispatcher;
use crate::services::event_publisher::DomainEvent;

/// Periodically sweeps due retries through the dispatcher.
pub struct RetryWorker {
    dispatcher: Dispatcher,
    config: WorkerConfig,
    shutdown: Arc<AtomicBool>,
}

impl RetryWorker {
    /// Create a new retry worker.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: WorkerConfig) -> Self {
        Self {
            dispatcher: dispatcher.with_sweep_batch_size(config.sweep_batch_size as i64),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle that makes `run` return after its current tick.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the sweep loop until shutdown is requested.
    pub async fn run(&self) {
        info!(
            target: "webhook_delivery",
            sweep_interval_secs = self.config.sweep_interval_secs,
            "Starting webhook retry worker"
        );

        let mut tick = interval(Duration::from_secs(self.config.sweep_interval_secs));
        loop {
            tick.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!(target: "webhook_delivery", "Retry worker shutdown requested");
                break;
            }

            if let Err(e) = self.dispatcher.process_pending_retries().await {
                error!(
                    target: "webhook_delivery",
                    error = %e,
                    "Retry sweep failed"
                );
            }
        }

        info!(target: "webhook_delivery", "Retry worker stopped");
    }
}

/// Drain published domain events into the dispatcher until the channel
/// closes. Lagged events are dropped with a warning; the retry sweep
/// cannot recover them, so channel capacity should exceed burst size.
pub async fn run_event_loop(
    dispatcher: Dispatcher,
    mut receiver: tokio::sync::broadcast::Receiver<DomainEvent>,
) {
    info!(target: "webhook_delivery", "Starting webhook event loop");

    loop {
        match receiver.recv().await {
            Ok(event) => {
                if let Err(e) = dispatcher
                    .dispatch(event.event_type, event.data, &event.scope)
                    .await
                {
                    error!(
                        target: "webhook_delivery",
                        event_id = %event.id,
                        event_type = %event.event_type,
                        error = %e,
                        "Failed to dispatch domain event"
                    );
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                warn!(
                    target: "webhook_delivery",
                    missed,
                    "Event loop lagged behind publisher; events dropped"
                );
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!(target: "webhook_delivery", "Event channel closed, stopping event loop");
                break;
            }
        }
    }
}
