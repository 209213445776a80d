//! Conversation history display component

use crate::events::ChatRole;
use crate::session::{Message, MessageId};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Read-only view over the session's messages
pub struct HistoryView<'a> {
    pub messages: &'a [Message],
    pub copied: Option<&'a MessageId>,
    pub selected: Option<usize>,
    /// `Some(frame)` while a reply is outstanding
    pub thinking_frame: Option<u8>,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && self.thinking_frame.is_none() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled("Welcome to Sidechat", Style::default().fg(Color::Green))]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled("Type a message below and press Enter.", Style::default().fg(Color::Gray))]),
                Line::from(vec![Span::styled("Shift+Enter for a new line, /help for commands.", Style::default().fg(Color::DarkGray))]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        let mut selected_start = None;
        for (index, message) in self.messages.iter().enumerate() {
            if self.selected == Some(index) {
                selected_start = Some(all_lines.len());
            }
            all_lines.extend(self.render_message(index, message, inner_area.width));
            all_lines.push(Line::from(vec![Span::raw("")]));
        }

        if let Some(frame) = self.thinking_frame {
            all_lines.extend(render_thinking(frame));
        }

        // Stick to the bottom unless that would hide the selected message
        let height = inner_area.height as usize;
        let mut start = all_lines.len().saturating_sub(height);
        if let Some(selected_start) = selected_start {
            start = start.min(selected_start);
        }

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

impl HistoryView<'_> {
    /// Render a single message into lines
    fn render_message(&self, index: usize, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let is_selected = self.selected == Some(index);
        let header_style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let timestamp = message.created_at().format("%H:%M:%S").to_string();
        let header = format!(
            "{} #{} {} {} {}",
            message.role().icon(),
            index + 1,
            message.role().display_name(),
            timestamp,
            "─".repeat(12)
        );

        let mut header_spans = vec![Span::styled(header, header_style)];
        if self.copied == Some(message.id()) {
            header_spans.push(Span::styled(
                " ✓ copied",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        }
        lines.push(Line::from(header_spans));

        let style = content_style(message);
        for content_line in wrap_text(message.content(), width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, style),
            ]));
        }

        lines
    }
}

/// Get content style based on role; failures are shown in red
fn content_style(message: &Message) -> Style {
    match message.role() {
        ChatRole::User => Style::default().fg(Color::Blue),
        ChatRole::Assistant if message.content().starts_with("Error: ") => {
            Style::default().fg(Color::Red)
        }
        ChatRole::Assistant => Style::default().fg(Color::Green),
    }
}

/// Placeholder bubble with an animated ellipsis
fn render_thinking(frame: u8) -> Vec<Line<'static>> {
    let dots = ".".repeat((frame as usize % 3) + 1);
    vec![
        Line::from(vec![Span::styled(
            format!("{} {}", ChatRole::Assistant.icon(), ChatRole::Assistant.display_name()),
            Style::default().fg(Color::DarkGray),
        )]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
    ]
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + word_len + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }

            // Hard-split words longer than a whole line
            let mut rest: Vec<char> = word.chars().collect();
            while rest.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                let tail = rest.split_off(width);
                lines.push(rest.into_iter().collect());
                rest = tail;
            }

            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_len += rest.len();
            current_line.extend(rest);
        }

        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick".to_string(), "brown fox".to_string()]
        );
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_lines() {
        assert_eq!(
            wrap_text("one\n\ntwo", 20),
            vec!["one".to_string(), String::new(), "two".to_string()]
        );
    }

    #[test]
    fn splits_overlong_words() {
        assert_eq!(
            wrap_text("abcdefghij", 4),
            vec!["abcd".to_string(), "efgh".to_string(), "ij".to_string()]
        );
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(wrap_text("héé héé", 7), vec!["héé héé".to_string()]);
    }

    #[test]
    fn zero_width_passes_through() {
        assert_eq!(wrap_text("anything", 0), vec!["anything".to_string()]);
    }
}
