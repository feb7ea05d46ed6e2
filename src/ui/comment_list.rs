use chrono::Utc;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use super::{first_line, list_area, list_title, relative_time, render_list, row_style, truncate};
use crate::app::App;
use crate::types::CommentRole;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_comments(frame, app, chunks[0]);
    render_selected_body(frame, app, chunks[1]);
}

fn render_comments(frame: &mut Frame, app: &App, area: Rect) {
    let list = &app.comments;
    let area = list_area(frame, app, list, area);

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 34; // @author(16) + role(7) + age(8) + spaces
    let flex = w.saturating_sub(fixed).max(10);
    let now = Utc::now();

    let items: Vec<ListItem> = list
        .visible()
        .enumerate()
        .map(|(i, comment)| {
            let role_color = match comment.role {
                CommentRole::Author => Color::Green,
                CommentRole::Collaborator => Color::Magenta,
                CommentRole::Other => Color::DarkGray,
            };

            let line = Line::from(vec![
                Span::styled(
                    format!("@{:<15}", truncate(&comment.author, 15)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<7}", comment.role.to_string()),
                    Style::default().fg(role_color),
                ),
                Span::styled(
                    format!("{:>5}", relative_time(comment.created_at, now)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw("  "),
                Span::styled(
                    truncate(first_line(&comment.body), flex),
                    row_style(i == list.cursor()),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    render_list(frame, list, list_title("Comments", list), items, area);
}

/// Full text of the selected comment, or the issue body when there is none.
fn render_selected_body(frame: &mut Frame, app: &App, area: Rect) {
    let (title, body) = match (app.comments.selected(), &app.current_issue) {
        (Some(comment), _) => (
            format!(" @{} ", comment.author),
            comment.body.as_str(),
        ),
        (None, Some(issue)) => (
            format!(" #{} by @{} ", issue.number, issue.author),
            issue.body.as_deref().unwrap_or(""),
        ),
        (None, None) => (String::new(), ""),
    };

    let lines: Vec<Line> = if body.trim().is_empty() {
        vec![Line::from(Span::styled(
            "No description provided.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        let mut in_code = false;
        body.lines()
            .map(|line| {
                if line.trim_start().starts_with("```") {
                    in_code = !in_code;
                    return Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                let style = if in_code {
                    Style::default().fg(Color::Yellow)
                } else if line.starts_with('>') {
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(line.to_string(), style))
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
