use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::Frame;

use super::truncate;
use crate::app::App;
use crate::types::{Issue, IssueFilter, Label, RepositoryInfo};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    if let Some(repository) = &app.view.repository {
        render_owner(frame, repository, chunks[0]);
    }
    render_filters(frame, app, chunks[1]);
    render_issues(frame, app, chunks[2]);
    render_pagination(frame, app, chunks[3]);
}

fn render_owner(frame: &mut Frame, repository: &RepositoryInfo, area: Rect) {
    let w = area.width.saturating_sub(2) as usize;
    let description = repository.description.as_deref().unwrap_or_default();

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("@{}", repository.owner.login),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" / "),
            Span::styled(
                repository.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            truncate(description, w),
            Style::default().fg(Color::Gray),
        )),
    ];

    let owner = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Repository ")
            .title_bottom(Line::from(" q: back to repositories ").right_aligned()),
    );
    frame.render_widget(owner, area);
}

fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = IssueFilter::ALL.iter().map(|f| f.label()).collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.view.requested_filter)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_issues(frame: &mut Frame, app: &App, area: Rect) {
    let issues = &app.view.issues;
    let block = Block::default().borders(Borders::ALL).title(format!(
        " {} ({}/{}) ",
        app.view.filter().label(),
        issues.len(),
        app.view.per_page()
    ));

    if issues.is_empty() {
        let empty = Paragraph::new("No issues on this page")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| issue_item(issue, i == app.selected, w))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

fn issue_item(issue: &Issue, is_selected: bool, width: usize) -> ListItem<'static> {
    let title_style = if is_selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let number = format!("#{:<6}", issue.number);
    let kind = if issue.pull_request { "PR " } else { "" };
    let labels_width: usize = issue.labels.iter().map(|l| l.name.chars().count() + 3).sum();
    let fixed = number.chars().count() + kind.len() + labels_width;
    let title = truncate(&issue.title, width.saturating_sub(fixed).max(10));

    let mut first = vec![
        Span::styled(number, Style::default().fg(Color::Cyan)),
        Span::styled(kind, Style::default().fg(Color::Magenta)),
        Span::styled(title, title_style),
    ];
    for label in &issue.labels {
        first.push(Span::raw(" "));
        first.push(label_chip(label));
    }

    let second = Line::from(vec![
        Span::raw("        "),
        Span::styled(
            format!("@{}", issue.user.login),
            Style::default().fg(Color::Gray),
        ),
    ]);

    ListItem::new(vec![Line::from(first), second])
}

fn label_chip(label: &Label) -> Span<'static> {
    let bg = label
        .color
        .as_deref()
        .and_then(parse_hex_color)
        .unwrap_or(Color::Magenta);
    Span::styled(
        format!(" {} ", label.name),
        Style::default().bg(bg).fg(Color::Black),
    )
}

/// "d73a4a" -> Rgb(0xd7, 0x3a, 0x4a)
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);

    let prev_style = if app.view.has_prev_page() {
        enabled
    } else {
        disabled
    };
    let at_end = app.view.is_last_page();
    let next_style = if at_end { disabled } else { enabled };

    let mut spans = vec![
        Span::styled("◀ Previous", prev_style),
        Span::raw("   "),
        Span::styled(
            format!("Page {}", app.view.current_page),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("Next ▶", next_style),
    ];
    if at_end {
        spans.push(Span::styled("  (end of list)", disabled));
    }

    let pagination = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(pagination, area);
}
