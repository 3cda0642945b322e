use chrono::{DateTime, Utc};
use core::fmt;
use core::pin::Pin;
use core::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

const LOG_TARGET: &str = "  exporter";

/// Paces the poll loop
pub trait Ticker {
    /// Wait for the next iteration and return the time it started, or `None` once the loop
    /// should stop.
    fn tick(&mut self) -> impl Future<Output = Option<DateTime<Utc>>> + Send;
}

/// Wall-clock [`Ticker`] that fires every `period` until SIGINT or SIGTERM arrives.
///
/// The first tick completes immediately. A tick that falls behind (a slow iteration) is
/// delayed rather than fired in a burst.
pub struct IntervalTicker {
    interval: Interval,
    shutdown: Pin<Box<dyn Future<Output = ()> + Send>>,
    stopped: bool,
}

impl IntervalTicker {
    /// Must be called from within a tokio runtime. `period` must be non-zero.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self::with_shutdown(period, shutdown_signal())
    }

    /// Like [`IntervalTicker::new`], but stops when `shutdown` resolves instead of on a signal.
    #[must_use]
    pub fn with_shutdown(period: Duration, shutdown: impl Future<Output = ()> + Send + 'static) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            interval,
            shutdown: Box::pin(shutdown),
            stopped: false,
        }
    }
}

impl fmt::Debug for IntervalTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalTicker")
            .field("period", &self.interval.period())
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> Option<DateTime<Utc>> {
        if self.stopped {
            return None;
        }

        // Shutdown is polled first so the signal handlers are installed on the first tick
        tokio::select! {
            biased;
            () = &mut self.shutdown => {
                log::info!(target: LOG_TARGET, "Shutdown signal received");
                self.stopped = true;
                None
            }
            _ = self.interval.tick() => Some(Utc::now()),
        }
    }
}

/// Resolve when the process is asked to terminate.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!(target: LOG_TARGET, "Could not listen for Ctrl-C: {e}");
            core::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                let _ = sigterm.recv().await;
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not listen for SIGTERM: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
