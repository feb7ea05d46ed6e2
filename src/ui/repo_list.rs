use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListItem;
use ratatui::Frame;

use super::{list_area, list_title, render_list, row_style, truncate};
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let list = &app.repos;
    let area = list_area(frame, app, list, area);

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 54; // name(30) + space + stars(7) + space + issues(7) + space + lang(10) - wiggle
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = list
        .visible()
        .enumerate()
        .map(|(i, repo)| {
            let description = repo
                .description
                .as_deref()
                .map(|d| truncate(d, flex))
                .unwrap_or_default();
            let language = repo.language.as_deref().unwrap_or("");

            let line = Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&repo.full_name, 30)),
                    row_style(i == list.cursor()),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("★ {:>5}", repo.stars),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("◯ {:>5}", repo.open_issues),
                    Style::default().fg(Color::Green),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("{:<10}", truncate(language, 10)),
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw(" "),
                Span::styled(description, Style::default().fg(Color::Gray)),
            ]);

            ListItem::new(line)
        })
        .collect();

    render_list(frame, list, list_title("Repositories", list), items, area);
}
