mod popup;
mod repository;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, LoadStatus};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    // Repository and issue fields are only touched once loading is done.
    match &app.view.status {
        LoadStatus::Uninitialized | LoadStatus::Loading => render_loading(frame, app, chunks[1]),
        LoadStatus::Ready => repository::render(frame, app, chunks[1]),
        LoadStatus::Failed(error) => {
            let block = Block::default().borders(Borders::ALL);
            frame.render_widget(block, chunks[1]);
            popup::render_error(
                frame,
                error.kind(),
                &error.to_string(),
                "Press r to retry, q to go back",
            );
        }
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(Line::from(vec![Span::styled(
        format!("issuescope - {}", app.repo),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_loading(frame: &mut Frame, app: &App, area: Rect) {
    let spinner = SPINNER[app.spinner % SPINNER.len()];
    let height = area.height.saturating_sub(2) / 2;
    let mut lines = vec![Line::from(""); height as usize];
    lines.push(Line::from(Span::styled(
        format!("{} Loading", spinner),
        Style::default().fg(Color::Yellow),
    )));

    let loading = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(loading, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if app.view.is_loading() {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = "h/l/1-3: filter | j/k: nav | p/n: page | Enter: open | y: yank url | r: refresh | q: back";
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Shorten `text` to at most `max` characters, ending in "..." when cut
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
