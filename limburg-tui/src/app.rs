use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use limburg_core::{
    model::PickupSnapshot,
    refresh::{RefreshCoordinator, RefreshState},
};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Overview,
    Upcoming,
}

pub(crate) struct App {
    pub coordinator: Arc<RefreshCoordinator>,

    pub screen: Screen,
    pub state: RefreshState,
    pub updates: watch::Receiver<RefreshState>,
    pub last_success: Option<DateTime<Local>>,

    pub upcoming_offset: usize,
}

impl App {
    pub(crate) fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        let mut updates = coordinator.subscribe();
        let state = updates.borrow_and_update().clone();
        let last_success = matches!(state, RefreshState::Succeeded(_)).then(Local::now);
        Self {
            coordinator,
            screen: Screen::Overview,
            state,
            updates,
            last_success,
            upcoming_offset: 0,
        }
    }

    pub(crate) fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn snapshot(&self) -> Option<&PickupSnapshot> {
        self.state.snapshot().map(Arc::as_ref)
    }

    /// Pull the latest coordinator state; returns whether the screen needs a redraw.
    #[must_use]
    pub(crate) fn sync(&mut self) -> bool {
        if !self.updates.has_changed().unwrap_or(false) {
            return false;
        }
        self.state = self.updates.borrow_and_update().clone();
        if matches!(self.state, RefreshState::Succeeded(_)) {
            self.last_success = Some(Local::now());
            self.clamp_offset();
        }
        true
    }

    pub(crate) fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Overview => Screen::Upcoming,
            Screen::Upcoming => Screen::Overview,
        };
    }

    pub(crate) fn scroll_up(&mut self) {
        self.upcoming_offset = self.upcoming_offset.saturating_sub(1);
    }

    pub(crate) fn scroll_down(&mut self) {
        if self.upcoming_offset + 1 < self.upcoming_len() {
            self.upcoming_offset += 1;
        }
    }

    fn upcoming_len(&self) -> usize {
        self.snapshot().map_or(0, |snapshot| snapshot.upcoming().len())
    }

    fn clamp_offset(&mut self) {
        self.upcoming_offset = self
            .upcoming_offset
            .min(self.upcoming_len().saturating_sub(1));
    }
}
