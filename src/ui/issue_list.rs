use chrono::Utc;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListItem;
use ratatui::Frame;

use super::{list_area, list_title, relative_time, render_list, row_style, truncate};
use crate::app::App;
use crate::types::IssueState;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let list = &app.issues;
    let area = list_area(frame, app, list, area);

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 48; // #num(6) + state(7) + @author(16) + comments(6) + age(8) + spaces
    let flex = w.saturating_sub(fixed).max(10);
    let now = Utc::now();

    let items: Vec<ListItem> = list
        .visible()
        .enumerate()
        .map(|(i, issue)| {
            let state_color = match issue.state {
                IssueState::Open => Color::Green,
                IssueState::Closed => Color::Red,
            };

            let mut spans = vec![
                Span::styled(
                    format!("#{:<5}", issue.number),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(format!("{:<6}", issue.state), Style::default().fg(state_color)),
                Span::raw(" "),
                Span::styled(
                    format!("{:<flex$}", truncate(&issue.title, flex)),
                    row_style(i == list.cursor()),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("@{:<15}", truncate(&issue.author, 15)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("💬{:>3}", issue.comments),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("{:>7}", relative_time(issue.updated_at, now)),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            for label in &issue.labels {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("[{}]", label),
                    Style::default().fg(Color::Yellow),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut title = list_title("Issues", list);
    if let Some(open) = app.open_issue_count {
        title.push_str(&format!("| {} open on server ", open));
    }
    render_list(frame, list, title, items, area);
}
