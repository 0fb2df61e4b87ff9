//! Refresh cycles driven through a scripted feed port.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use limburg_core::{
    Clock, FeedError, FeedPort, FeedStatus, Pickup, RefreshCoordinator, RefreshState,
    SourceConfig, SourceKind, SourceLoader, WasteType,
};
use url::Url;

const FEED: &str = "Datum;Ophaling;Verwijderd;Reden\n\
                    2025-01-10;Huisvuil;;\n\
                    20/12/2024;PMD;;\n\
                    2025-01-05;Onbekend;;\n\
                    14-01-2025;PMD;;\n";

struct FixedClock(NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Default)]
struct ScriptedPort {
    responses: Mutex<VecDeque<Result<String, FeedError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedPort {
    fn new(responses: Vec<Result<String, FeedError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedPort for ScriptedPort {
    async fn fetch_url(&self, _url: &Url) -> Result<String, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or(Err(FeedError::Status(500)))
    }

    async fn read_file(&self, path: &Path) -> Result<String, FeedError> {
        Err(FeedError::NotFound(path.to_path_buf()))
    }
}

fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).expect("valid test date")
}

fn remote() -> SourceConfig {
    SourceConfig::builder(SourceKind::Url)
        .parameter("https://feed.example/limburg.csv")
        .expect("valid url")
}

fn coordinator(port: Arc<ScriptedPort>, source: SourceConfig) -> RefreshCoordinator {
    let loader = SourceLoader::new(port, "/srv/config");
    RefreshCoordinator::new(loader, source, Duration::from_secs(3600))
        .with_clock(Arc::new(FixedClock(day(2025, 1, 1))))
}

#[tokio::test]
async fn upload_feed_yields_only_future_pickups() {
    let source = SourceConfig::builder(SourceKind::Upload)
        .parameter(FEED)
        .expect("valid upload");
    let coordinator = coordinator(Arc::new(ScriptedPort::default()), source);

    let state = coordinator.refresh().await;
    let snapshot = state.snapshot().expect("snapshot after success");

    assert_eq!(snapshot.source(), "upload");
    assert_eq!(
        snapshot.upcoming(),
        [
            Pickup {
                date: day(2025, 1, 10),
                waste_type: WasteType::Residual,
            },
            Pickup {
                date: day(2025, 1, 14),
                waste_type: WasteType::Packaging,
            },
        ]
    );
    assert_eq!(
        snapshot.next_overall().map(ToString::to_string).as_deref(),
        Some("Huisvuil on 2025-01-10")
    );
    assert_eq!(
        snapshot.next_for(WasteType::Packaging).map(|pickup| pickup.date),
        Some(day(2025, 1, 14))
    );
    assert_eq!(state.status(), FeedStatus::Fresh);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_snapshot() {
    let port = Arc::new(ScriptedPort::new(vec![
        Ok(FEED.to_owned()),
        Err(FeedError::Status(500)),
    ]));
    let coordinator = coordinator(Arc::clone(&port), remote());

    let first = coordinator.refresh().await;
    let fresh = first.snapshot().cloned().expect("first refresh succeeds");

    let second = coordinator.refresh().await;
    assert!(matches!(second.error(), Some(FeedError::Status(500))));
    assert!(matches!(second.status(), FeedStatus::Stale { .. }));

    let served = coordinator.snapshot().expect("stale snapshot is still served");
    assert!(Arc::ptr_eq(&served, &fresh), "snapshot must be left untouched");
    assert_eq!(port.calls(), 2);
}

#[tokio::test]
async fn first_failure_reports_no_data() {
    let port = Arc::new(ScriptedPort::new(vec![Err(FeedError::Status(503))]));
    let coordinator = coordinator(port, remote());

    let state = coordinator.refresh().await;
    assert_eq!(
        state.status(),
        FeedStatus::NoData {
            error: "Failed to download CSV (status 503)".to_owned()
        }
    );
    assert!(coordinator.snapshot().is_none());
}

#[tokio::test]
async fn missing_local_file_is_reported() {
    let source = SourceConfig::builder(SourceKind::Url)
        .parameter("www/limburg.csv")
        .expect("valid path");
    let coordinator = coordinator(Arc::new(ScriptedPort::default()), source);

    let state = coordinator.refresh().await;
    assert!(matches!(
        state.error(),
        Some(FeedError::NotFound(path)) if path == Path::new("/srv/config/www/limburg.csv")
    ));
}

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_share_one_cycle() {
    let port = Arc::new(ScriptedPort {
        delay: Some(Duration::from_secs(1)),
        ..ScriptedPort::new(vec![Ok(FEED.to_owned()), Ok(FEED.to_owned())])
    });
    let coordinator = coordinator(Arc::clone(&port), remote());

    let (first, second) = tokio::join!(coordinator.refresh(), coordinator.refresh());

    assert_eq!(port.calls(), 1, "the second caller must not start its own cycle");
    let first = first.snapshot().cloned().expect("first caller sees the snapshot");
    let second = second.snapshot().cloned().expect("second caller sees the snapshot");
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn subscribers_observe_state_changes() {
    let port = Arc::new(ScriptedPort::new(vec![Ok(FEED.to_owned())]));
    let coordinator = coordinator(port, remote());
    let mut receiver = coordinator.subscribe();

    assert!(matches!(*receiver.borrow_and_update(), RefreshState::Idle));
    let _state = coordinator.refresh().await;

    assert!(receiver.has_changed().expect("sender alive"));
    assert!(matches!(
        *receiver.borrow_and_update(),
        RefreshState::Succeeded(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn fetch_errors_are_retried_on_each_tick() {
    let port = Arc::new(ScriptedPort::default());
    let coordinator = Arc::new(coordinator(Arc::clone(&port), remote()));

    let handle = coordinator.spawn();
    tokio::time::sleep(Duration::from_secs(3 * 3600 + 1)).await;
    handle.abort();

    assert_eq!(port.calls(), 3);
    assert!(matches!(coordinator.state().status(), FeedStatus::NoData { .. }));
}

#[tokio::test(start_paused = true)]
async fn configuration_errors_stop_the_schedule() {
    let source = SourceConfig::Url {
        source_url: "../outside.csv".to_owned(),
    };
    let coordinator = coordinator(Arc::new(ScriptedPort::default()), source);

    let stopped = tokio::time::timeout(Duration::from_secs(2 * 3600), coordinator.run()).await;

    assert!(stopped.is_ok(), "run must return after a configuration error");
    assert!(matches!(
        coordinator.state().error(),
        Some(FeedError::OutsideBaseDir(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn cancelled_refresh_restores_previous_state() {
    let port = Arc::new(ScriptedPort {
        delay: Some(Duration::from_secs(60)),
        ..ScriptedPort::new(vec![Ok(FEED.to_owned()), Ok(FEED.to_owned())])
    });
    let coordinator = Arc::new(coordinator(Arc::clone(&port), remote()));
    let fresh = coordinator
        .refresh()
        .await
        .snapshot()
        .cloned()
        .expect("first refresh succeeds");

    let background = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.refresh().await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(coordinator.state().status(), FeedStatus::Refreshing);

    background.abort();
    assert!(background.await.is_err(), "cycle must be cancelled");

    assert_eq!(coordinator.state().status(), FeedStatus::Fresh);
    let served = coordinator.snapshot().expect("snapshot is still served");
    assert!(Arc::ptr_eq(&served, &fresh));
    assert_eq!(port.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unschedulable_interval_stops_without_panicking() {
    let loader = SourceLoader::new(Arc::new(ScriptedPort::default()), "/srv/config");
    let coordinator = Arc::new(RefreshCoordinator::new(
        loader,
        remote(),
        Duration::from_secs(u64::MAX),
    ));

    let finished = tokio::time::timeout(Duration::from_secs(1), coordinator.spawn()).await;

    assert!(
        matches!(finished, Ok(Ok(()))),
        "schedule must end cleanly instead of panicking"
    );
    assert!(matches!(coordinator.state(), RefreshState::Idle));
}
