//! Scheduled Load → Parse → Aggregate cycles with a cached last-good snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::aggregate::aggregate;
use crate::ingest::parse_feed;
use crate::model::PickupSnapshot;
use crate::ports::{FeedError, FeedPort};
use crate::settings::Settings;
use crate::source::{SourceConfig, SourceLoader};

/// Source of the reference day used to filter past pickups.
pub trait Clock: Send + Sync {
    /// The current calendar day.
    fn today(&self) -> NaiveDate;
}

/// Clock following the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Lifecycle of the coordinator.
#[derive(Debug, Clone)]
pub enum RefreshState {
    /// No cycle has run yet.
    Idle,
    /// A cycle is running; the previous snapshot is still served.
    Refreshing {
        /// Snapshot of the last successful cycle, if any.
        last_good: Option<Arc<PickupSnapshot>>,
        /// Error of the previous cycle, if it failed.
        last_error: Option<Arc<FeedError>>,
    },
    /// The last cycle succeeded.
    Succeeded(Arc<PickupSnapshot>),
    /// The last cycle failed.
    Failed {
        /// Why the cycle failed.
        error: Arc<FeedError>,
        /// Snapshot of the last successful cycle, if any.
        last_good: Option<Arc<PickupSnapshot>>,
    },
}

impl RefreshState {
    /// Snapshot consumers should display, fresh or stale.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<PickupSnapshot>> {
        match self {
            RefreshState::Idle => None,
            RefreshState::Succeeded(snapshot) => Some(snapshot),
            RefreshState::Refreshing { last_good, .. } | RefreshState::Failed { last_good, .. } => {
                last_good.as_ref()
            }
        }
    }

    /// Error of the last finished cycle, if it failed.
    ///
    /// While a cycle is running this still reports the failure of the one before it.
    #[must_use]
    pub fn error(&self) -> Option<&FeedError> {
        self.last_error().map(Arc::as_ref)
    }

    fn last_error(&self) -> Option<&Arc<FeedError>> {
        match self {
            RefreshState::Failed { error, .. } => Some(error),
            RefreshState::Refreshing { last_error, .. } => last_error.as_ref(),
            RefreshState::Idle | RefreshState::Succeeded(_) => None,
        }
    }

    /// How fresh the served data is.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        match self {
            RefreshState::Idle => FeedStatus::Pending,
            RefreshState::Refreshing { .. } => FeedStatus::Refreshing,
            RefreshState::Succeeded(_) => FeedStatus::Fresh,
            RefreshState::Failed {
                error,
                last_good: Some(_),
            } => FeedStatus::Stale {
                error: error.to_string(),
            },
            RefreshState::Failed {
                error,
                last_good: None,
            } => FeedStatus::NoData {
                error: error.to_string(),
            },
        }
    }
}

/// Freshness marker shown next to the published data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Waiting for the first cycle.
    Pending,
    /// A cycle is in flight.
    Refreshing,
    /// Data comes from the latest cycle.
    Fresh,
    /// The latest cycle failed; older data is served.
    Stale {
        /// Message of the failure.
        error: String,
    },
    /// Every cycle so far failed.
    NoData {
        /// Message of the failure.
        error: String,
    },
}

impl FeedStatus {
    /// Short machine-friendly name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FeedStatus::Pending => "pending",
            FeedStatus::Refreshing => "refreshing",
            FeedStatus::Fresh => "fresh",
            FeedStatus::Stale { .. } => "stale",
            FeedStatus::NoData { .. } => "no_data",
        }
    }

    /// Failure message for stale or missing data.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            FeedStatus::Stale { error } | FeedStatus::NoData { error } => Some(error),
            FeedStatus::Pending | FeedStatus::Refreshing | FeedStatus::Fresh => None,
        }
    }
}

/// Puts the previous state back when a cycle is dropped before it finishes.
struct CycleGuard<'a> {
    state: &'a watch::Sender<RefreshState>,
    previous: Option<RefreshState>,
}

impl CycleGuard<'_> {
    fn finish(mut self, next: RefreshState) {
        self.previous = None;
        self.state.send_replace(next);
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!("refresh cycle cancelled, restoring previous state");
            self.state.send_replace(previous);
        }
    }
}

/// Runs refresh cycles for one source, one at a time.
pub struct RefreshCoordinator {
    loader: SourceLoader,
    source: SourceConfig,
    interval: Duration,
    clock: Arc<dyn Clock>,
    state: watch::Sender<RefreshState>,
    in_flight: Mutex<()>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator using the local clock.
    #[must_use]
    pub fn new(loader: SourceLoader, source: SourceConfig, interval: Duration) -> Self {
        let (state, _receiver) = watch::channel(RefreshState::Idle);
        Self {
            loader,
            source,
            interval,
            clock: Arc::new(LocalClock),
            state,
            in_flight: Mutex::new(()),
        }
    }

    /// Wire a coordinator from validated settings.
    #[must_use]
    pub fn from_settings(settings: Settings, port: Arc<dyn FeedPort>) -> Self {
        let loader = SourceLoader::new(port, settings.base_dir).with_timeout(settings.fetch_timeout);
        Self::new(loader, settings.source, settings.refresh_interval)
    }

    /// Replace the clock, e.g. with a fixed day.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured source.
    #[must_use]
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Time between scheduled refreshes.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RefreshState {
        self.state.borrow().clone()
    }

    /// Snapshot consumers should display, fresh or stale.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<PickupSnapshot>> {
        self.state.borrow().snapshot().cloned()
    }

    /// Receiver notified whenever the state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.state.subscribe()
    }

    /// Run one cycle and return the resulting state.
    ///
    /// A call made while another cycle is in flight waits for that cycle and returns its
    /// outcome instead of starting a second one. Failures keep the previous snapshot, and a
    /// cycle dropped midway restores the state it started from.
    pub async fn refresh(&self) -> RefreshState {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("refresh already in flight, waiting for its result");
            let _finished = self.in_flight.lock().await;
            return self.state();
        };

        let previous = self.state();
        let last_good = previous.snapshot().cloned();
        self.state.send_replace(RefreshState::Refreshing {
            last_good: last_good.clone(),
            last_error: previous.last_error().cloned(),
        });
        let cycle = CycleGuard {
            state: &self.state,
            previous: Some(previous),
        };

        let next = match self.run_cycle().await {
            Ok(snapshot) => {
                info!(
                    source = snapshot.source(),
                    upcoming = snapshot.upcoming().len(),
                    next = ?snapshot.next_overall().map(ToString::to_string),
                    "refreshed pickup data"
                );
                RefreshState::Succeeded(Arc::new(snapshot))
            }
            Err(err) => {
                warn!(
                    source = self.source.identifier(),
                    error = %err,
                    stale = last_good.is_some(),
                    "error updating pickup data"
                );
                RefreshState::Failed {
                    error: Arc::new(err),
                    last_good,
                }
            }
        };

        cycle.finish(next.clone());
        next
    }

    /// Refresh on a fixed interval until a configuration error occurs.
    ///
    /// The first tick fires one interval from now; run [`Self::refresh`] for the eager first load.
    /// An interval too long to schedule returns immediately.
    pub async fn run(&self) {
        let Some(start) = Instant::now().checked_add(self.interval) else {
            error!(interval = ?self.interval, "refresh interval out of range, not scheduling");
            return;
        };
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let RefreshState::Failed { error, .. } = self.refresh().await
                && error.is_configuration()
            {
                error!(%error, "configuration error, stopping scheduled refreshes");
                break;
            }
        }
    }

    /// Spawn [`Self::run`] on the tokio runtime.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.run().await })
    }

    async fn run_cycle(&self) -> Result<PickupSnapshot, FeedError> {
        let raw = self.loader.load(&self.source).await?;
        let records = parse_feed(&raw);
        Ok(aggregate(
            self.source.identifier(),
            &records,
            self.clock.today(),
        ))
    }
}
