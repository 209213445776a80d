//! API key prompt shown until a credential is confirmed

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

pub struct CredentialView<'a> {
    pub credential: &'a str,
    pub endpoint: &'a str,
    pub rejected: bool,
}

/// Bullets for everything but the last four characters
pub fn mask(credential: &str) -> String {
    let count = credential.chars().count();
    let visible = count.saturating_sub(4);
    credential
        .chars()
        .enumerate()
        .map(|(i, c)| if i < visible { '•' } else { c })
        .collect()
}

impl Widget for CredentialView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered(area, 70, 9);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" 🔑 API key ")
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let hint = if self.rejected {
            Span::styled("A key is required.", Style::default().fg(Color::Red))
        } else {
            Span::styled("Enter to confirm, Esc to quit", Style::default().fg(Color::DarkGray))
        };

        let lines = vec![
            Line::from(Span::raw(format!("Requests go to {}", self.endpoint))),
            Line::from(Span::styled(
                "The key stays in memory for this session only.",
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Key: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(mask(self.credential)),
                Span::raw("▌"),
            ]),
            Line::from(""),
            Line::from(hint),
        ];

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
