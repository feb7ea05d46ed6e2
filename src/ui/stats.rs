use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::listview::Stats;

pub fn render(frame: &mut Frame, stats: &Stats, area: Rect) {
    let label = Style::default().fg(Color::Gray);
    let value = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::from(vec![
        Span::styled("Total      ", label),
        Span::styled(stats.total.to_string(), value),
    ])];

    // A lone "All" category says nothing the total doesn't
    if stats.categories.len() > 1 {
        for (name, count) in stats.categories.iter().skip(1) {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<11}", name), label),
                Span::styled(count.to_string(), value),
            ]));
        }
    }

    if !stats.totals.is_empty() {
        lines.push(Line::from(""));
        for (name, sum) in &stats.totals {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<11}", name), label),
                Span::styled(sum.to_string(), value),
            ]));
        }
    }

    for group in &stats.groups {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Top {} ({} distinct)", group.attribute, group.distinct),
            Style::default().fg(Color::Cyan),
        )));
        let top = if group.top.is_empty() {
            "none".to_string()
        } else {
            group.describe()
        };
        lines.push(Line::from(Span::raw(format!("  {}", top))));
    }

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Stats "))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}
