use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run a refresh in the background
    Refresh,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Esc, Left, Right, Tab, Up};

    // Global shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.modifiers.is_empty() {
        match key.code {
            Char('q') => return Action::Quit,
            Char('r') => return Action::Refresh,
            _ => {}
        }
    }

    match (app.screen, key.code) {
        (_, Tab | Left | Right) => app.toggle_screen(),
        (Screen::Upcoming, Up | Char('k')) => app.scroll_up(),
        (Screen::Upcoming, Down | Char('j')) => app.scroll_down(),
        (Screen::Upcoming, Esc | Char('b')) => app.screen = Screen::Overview,
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use limburg_core::{
        refresh::RefreshCoordinator,
        source::{SourceConfig, SourceKind, SourceLoader},
    };

    use super::*;

    const FEED: &str = "Datum;Ophaling\n2999-01-01;PMD\n2999-01-08;Huisvuil\n2999-01-15;PMD\n";

    fn app() -> App {
        let client = limburg_provider_http::client().expect("client");
        let port = limburg_provider_http::port(client, Duration::from_secs(1));
        let source = SourceConfig::builder(SourceKind::Upload)
            .parameter(FEED)
            .expect("valid upload");
        let coordinator = RefreshCoordinator::new(
            SourceLoader::new(port, "."),
            source,
            Duration::from_secs(3600),
        );
        App::new(Arc::new(coordinator))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn global_shortcuts() {
        let mut app = app();
        assert_eq!(handle_key_event(press(KeyCode::Char('q')), &mut app), Action::Quit);
        assert_eq!(handle_key_event(press(KeyCode::Char('r')), &mut app), Action::Refresh);
        assert_eq!(
            handle_key_event(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &mut app
            ),
            Action::Quit
        );
    }

    #[test]
    fn tab_switches_screens() {
        let mut app = app();
        assert_eq!(app.screen, Screen::Overview);
        assert_eq!(handle_key_event(press(KeyCode::Tab), &mut app), Action::None);
        assert_eq!(app.screen, Screen::Upcoming);
        let _action = handle_key_event(press(KeyCode::Esc), &mut app);
        assert_eq!(app.screen, Screen::Overview);
    }

    #[tokio::test]
    async fn scrolling_stays_within_upcoming_pickups() {
        let mut app = app();
        let _state = app.coordinator.refresh().await;
        assert!(app.sync(), "refresh must be picked up");
        assert!(!app.sync(), "nothing changed since the last sync");
        assert!(app.last_success.is_some());

        app.screen = Screen::Upcoming;
        for _ in 0..5 {
            let _action = handle_key_event(press(KeyCode::Down), &mut app);
        }
        assert_eq!(app.upcoming_offset, 2);

        let _action = handle_key_event(press(KeyCode::Up), &mut app);
        assert_eq!(app.upcoming_offset, 1);
    }
}
