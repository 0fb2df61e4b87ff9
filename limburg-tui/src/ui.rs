use chrono::NaiveDate;
use limburg_core::{
    model::{PickupSnapshot, WasteType},
    refresh::FeedStatus,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    // Title / header
    let source = app.coordinator.source().identifier();
    let header = Paragraph::new(format!("Limburg.net waste pickups · {source}"))
        .block(Block::default().borders(Borders::ALL).title("Pickups"));
    frame.render_widget(header, *header_area);

    // Main screen
    match app.snapshot() {
        None => draw_no_data(frame, app, *content_area),
        Some(snapshot) => match app.screen {
            Screen::Overview => draw_overview(frame, snapshot, *content_area),
            Screen::Upcoming => draw_upcoming(frame, snapshot, app.upcoming_offset, *content_area),
        },
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::Overview => "Tab all pickups · r refresh · q/Ctrl-C quit",
        Screen::Upcoming => "↑/↓ scroll · Tab/Esc overview · r refresh · q/Ctrl-C quit",
    };

    let status = app.state.status();
    let refreshed = app.last_success.map_or_else(
        || "never refreshed".to_owned(),
        |at| format!("refreshed {}", at.format("%d.%m.%Y %H:%M")),
    );
    let status_text = match &status {
        FeedStatus::Pending => format!("Waiting for first refresh · {nav_hint}"),
        FeedStatus::Refreshing => format!("Refreshing… · {refreshed} · {nav_hint}"),
        FeedStatus::Fresh => format!("Up to date · {refreshed} · {nav_hint}"),
        FeedStatus::Stale { error } => {
            format!("Showing stale data ({error}) · {refreshed} · {nav_hint}")
        }
        FeedStatus::NoData { error } => format!("Unavailable: {error} · {nav_hint}"),
    };

    let status_style = match status {
        FeedStatus::Stale { .. } | FeedStatus::NoData { .. } => Style::default().fg(Color::Red),
        FeedStatus::Pending | FeedStatus::Refreshing => Style::default().fg(Color::Yellow),
        FeedStatus::Fresh => Style::default(),
    };

    let status_widget = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status_widget, *status_area);
}

fn draw_no_data(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let message = match app.state.status() {
        FeedStatus::NoData { error } => format!("No pickup data available.\n\n{error}"),
        _ => "Loading pickup data…".to_owned(),
    };
    let paragraph = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title("Overview"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_overview(frame: &mut Frame<'_>, snapshot: &PickupSnapshot, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // next pickup
            Constraint::Min(0),    // categories
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [next_area, table_area] = chunks else {
        return;
    };

    let today = App::today();
    let next_text = snapshot.next_overall().map_or_else(
        || "No upcoming pickups".to_owned(),
        |pickup| format!("{pickup} ({})", relative_day_label(pickup.date, today)),
    );
    let next = Paragraph::new(next_text)
        .block(Block::default().borders(Borders::ALL).title("Next waste pickup"))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(next, *next_area);

    let rows = WasteType::ALL.into_iter().map(|waste_type| {
        let view = snapshot.category_view(waste_type);
        let (date, weekday, relative) = view.next_pickup_date.map_or_else(
            || ("–".to_owned(), String::new(), String::new()),
            |date| {
                (
                    date.format("%d.%m.%Y").to_string(),
                    date.format("%a").to_string(),
                    relative_day_label(date, today),
                )
            },
        );

        Row::new(vec![
            Cell::from(waste_type.label()),
            Cell::from(date),
            Cell::from(weekday),
            Cell::from(relative),
            Cell::from(view.upcoming_dates.len().to_string()),
        ])
        .style(Style::default().fg(waste_type_color(waste_type)))
    });

    let column_widths = [
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Min(8),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Category", "Next", "Day", "In", "Upcoming"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Per category"))
        .column_spacing(1);

    frame.render_widget(table, *table_area);
}

fn draw_upcoming(frame: &mut Frame<'_>, snapshot: &PickupSnapshot, offset: usize, area: Rect) {
    let title = format!("All upcoming pickups ({})", snapshot.upcoming().len());

    if snapshot.upcoming().is_empty() {
        let paragraph = Paragraph::new("No upcoming pickups in the feed.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let today = App::today();
    let rows = snapshot.upcoming().iter().skip(offset).map(|pickup| {
        let mut style = Style::default().fg(waste_type_color(pickup.waste_type));
        if pickup.date == today {
            style = style.add_modifier(Modifier::BOLD);
        }

        Row::new(vec![
            Cell::from(pickup.date.format("%d.%m.%Y").to_string()),
            Cell::from(pickup.date.format("%a").to_string()),
            Cell::from(relative_day_label(pickup.date, today)),
            Cell::from(pickup.waste_type.label()),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Date", "Day", "In", "Category"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn waste_type_color(waste_type: WasteType) -> Color {
    match waste_type {
        WasteType::Residual => Color::Gray,
        WasteType::Packaging => Color::Blue,
        WasteType::Textile => Color::Magenta,
        WasteType::Paper => Color::Yellow,
        WasteType::Garden => Color::Green,
        WasteType::Kitchen => Color::LightGreen,
    }
}

fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_owned(),
        1 => "tomorrow".to_owned(),
        days if days > 1 => format!("in {days} days"),
        -1 => "yesterday".to_owned(),
        days => format!("{} days ago", days.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_labels() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
        let later = |days| today + chrono::Duration::days(days);
        assert_eq!(relative_day_label(today, today), "today");
        assert_eq!(relative_day_label(later(1), today), "tomorrow");
        assert_eq!(relative_day_label(later(9), today), "in 9 days");
        assert_eq!(relative_day_label(later(-3), today), "3 days ago");
    }
}
