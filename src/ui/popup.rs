use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::ExportModal;
use crate::types::ExportFormat;

fn popup_block(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" {} ", title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render a centered confirmation popup: [y]es / [n]o
pub fn render_confirm(frame: &mut Frame, title: &str, message: &str) {
    let area = centered_rect(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::raw(message)),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Green)),
            Span::raw("es  "),
            Span::styled("[n]", Style::default().fg(Color::Red)),
            Span::raw("o"),
        ]),
    ];

    let popup = Paragraph::new(lines)
        .block(popup_block(title))
        .alignment(Alignment::Center);

    frame.render_widget(popup, area);
}

/// Render a single-line text prompt
pub fn render_input(frame: &mut Frame, title: &str, hint: &str, value: &str) {
    let area = centered_rect(60, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(value),
            Span::styled("_", Style::default().fg(Color::Gray)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(popup_block(title)), area);
}

/// Export dialog: repository picker, format, and the selection's description
pub fn render_export(frame: &mut Frame, modal: &ExportModal) {
    let height = (modal.repos.len() as u16 + 8).clamp(10, 20);
    let area = centered_rect(60, height, frame.area());
    frame.render_widget(Clear, area);

    let block = popup_block("Export issues");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    if modal.loading {
        let loading = Paragraph::new("Loading repositories...")
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(loading, chunks[0]);
    } else if modal.repos.is_empty() {
        let empty = Paragraph::new("No repositories to export")
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = modal
            .repos
            .iter()
            .enumerate()
            .map(|(i, repo)| {
                let prefix = if i == modal.selected { "> " } else { "  " };
                let style = if i == modal.selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{}{}", prefix, repo.full_name), style),
                    Span::styled(
                        format!(" ({} Issues)", repo.open_issues),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(modal.selected));
        frame.render_stateful_widget(List::new(items), chunks[0], &mut state);
    }

    let description = modal
        .selected_repo()
        .and_then(|r| r.description.as_deref())
        .filter(|d| !d.is_empty())
        .unwrap_or("No description");
    frame.render_widget(
        Paragraph::new(description)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );

    let format_span = |format: ExportFormat| {
        let style = if format == modal.format {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(format!("[{}]", format), style)
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw("Format: "),
            format_span(ExportFormat::Json),
            Span::raw(" "),
            format_span(ExportFormat::Csv),
        ])),
        chunks[2],
    );

    frame.render_widget(
        Paragraph::new("Tab: format | Enter: export | Esc: cancel")
            .style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

/// Create a centered rect of at most `width` x `height` inside `outer`
fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let popup_width = width.min(outer.width);
    let popup_height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((outer.height.saturating_sub(popup_height)) / 2),
            Constraint::Length(popup_height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((outer.width.saturating_sub(popup_width)) / 2),
            Constraint::Length(popup_width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_centered_and_clamped() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(50, 10, outer), Rect::new(25, 15, 50, 10));

        let small = Rect::new(0, 0, 30, 5);
        let rect = centered_rect(50, 10, small);
        assert_eq!((rect.width, rect.height), (30, 5));
    }
}
