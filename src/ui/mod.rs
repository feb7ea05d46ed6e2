mod comment_list;
mod issue_list;
mod popup;
mod repo_list;
mod stats;

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::action::{ConfirmAction, Screen};
use crate::app::{App, InputMode, Popup};
use crate::listview::{Choice, ListView, LoadState, Record};
use crate::toast::ToastKind;

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

    match app.screen {
        Screen::Repos => repo_list::render(frame, app, chunks[1]),
        Screen::Issues => issue_list::render(frame, app, chunks[1]),
        Screen::Comments => comment_list::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);

    if app.input_mode == InputMode::AddRepo {
        popup::render_input(
            frame,
            "Add repository",
            "owner/repo or https://github.com/owner/repo",
            &app.add_repo_input,
        );
    }

    match &app.popup {
        Some(Popup::Confirm(ConfirmAction::RemoveRepo(name))) => {
            popup::render_confirm(frame, "Remove repository", &format!("Remove {}?", name));
        }
        Some(Popup::Confirm(ConfirmAction::DeleteComment(_))) => {
            popup::render_confirm(frame, "Delete comment", "Delete this comment?");
        }
        Some(Popup::Export(modal)) => popup::render_export(frame, modal),
        None => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let repo = app.current_repo.as_deref().unwrap_or("repository");
    let title = match app.screen {
        Screen::Repos => format!("hubnote - {}", app.backend().base_url()),
        Screen::Issues => format!("hubnote - {}", repo),
        Screen::Comments => match &app.current_issue {
            Some(issue) => format!("hubnote - {} #{}: {}", repo, issue.number, issue.title),
            None => format!("hubnote - {}", repo),
        },
    };

    let header = Paragraph::new(Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.input_mode == InputMode::Search {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(app.search_input.as_str()),
            Span::styled("_", Style::default().fg(Color::Gray)),
        ])
    } else if let Some(toast) = app.toasts.current() {
        let color = match toast.kind {
            ToastKind::Info => Color::White,
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        Line::from(vec![Span::styled(
            toast.message.as_str(),
            Style::default().fg(color),
        )])
    } else if app.is_loading() {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match app.screen {
            Screen::Repos => {
                "j/k: nav | Enter: issues | /: search | s/S: sort | t: stats | a: add | d: remove | x: export | q: quit"
            }
            Screen::Issues => {
                "j/k: nav | Enter: comments | /: search | f: filter | s/S: sort | e: edit | c: comment | n: more | q: back"
            }
            Screen::Comments => {
                "j/k: nav | /: search | f: filter | s/S: sort | c: reply | >: quote | e: edit | d: delete | q: back"
            }
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Lay out the banner line and the optional stats panel around a list.
/// Returns the area left for the list itself.
fn list_area<R: Record>(frame: &mut Frame, app: &App, list: &ListView<R>, area: Rect) -> Rect {
    let area = if app.show_stats {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(36)])
            .split(area);
        stats::render(frame, &list.stats(), columns[1]);
        columns[0]
    } else {
        area
    };

    match list.banner() {
        Some(banner) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(0)])
                .split(area);
            let line = Paragraph::new(Span::styled(
                format!(" {}", banner),
                Style::default().fg(Color::Cyan),
            ));
            frame.render_widget(line, rows[0]);
            rows[1]
        }
        None => area,
    }
}

/// `Issues (3/10) | Open | Updated ↓`
fn list_title<R: Record>(name: &str, list: &ListView<R>) -> String {
    let (sort, direction) = list.active_sort();
    let count = if list.visible_len() == list.len() {
        list.len().to_string()
    } else {
        format!("{}/{}", list.visible_len(), list.len())
    };
    let mut title = format!(" {} ({})", name, count);
    if R::Filter::ALL.len() > 1 {
        title.push_str(&format!(" | {}", list.active_filter().label()));
    }
    title.push_str(&format!(" | {} {} ", sort.label(), direction.arrow()));
    title
}

/// Placeholder shown instead of an empty list, if any.
fn empty_text<R: Record>(list: &ListView<R>) -> Option<String> {
    if list.visible_len() > 0 {
        return None;
    }
    Some(match &list.state {
        LoadState::Idle | LoadState::Loading => "Loading...".to_string(),
        LoadState::Error(message) => message.clone(),
        LoadState::Loaded if list.is_empty() => format!("No {}", R::NOUN),
        LoadState::Loaded => format!("No matching {}", R::NOUN),
    })
}

/// Shared list chrome: placeholder when empty, highlighted cursor otherwise.
fn render_list<R: Record>(
    frame: &mut Frame,
    list: &ListView<R>,
    title: String,
    items: Vec<ListItem>,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL).title(title);

    if let Some(text) = empty_text(list) {
        let color = if matches!(list.state, LoadState::Error(_)) {
            Color::Red
        } else {
            Color::Gray
        };
        let empty = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(empty, area);
        return;
    }

    let widget = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(list.cursor()));
    frame.render_stateful_widget(widget, area, &mut state);
}

/// Row style for the cursor row vs. the rest
fn row_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Cut to `width` characters, ending in "..." when shortened.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// `3d`, `5h`, `12m`; empty when unknown
fn relative_time(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return String::new();
    };
    let age = now.signed_duration_since(at);
    if age.num_days() > 365 {
        format!("{}y", age.num_days() / 365)
    } else if age.num_days() > 0 {
        format!("{}d", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h", age.num_hours())
    } else {
        format!("{}m", age.num_minutes().max(0))
    }
}

/// First line of a body, for one-row previews
fn first_line(s: &str) -> &str {
    s.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}
