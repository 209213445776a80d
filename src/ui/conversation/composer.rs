use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    Submitted,
    Command(ParsedCommand),
    None,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Line editor for the draft message.
///
/// The text itself belongs to the session; the composer only tracks where
/// the cursor is inside it.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    cursor_position: usize,
}

impl ConversationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Handle key input against the draft
    pub fn handle_key(&mut self, key: KeyEvent, draft: &mut String) -> ConversationResult {
        if key.kind != KeyEventKind::Press {
            return ConversationResult::None;
        }

        self.clamp(draft);

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT)
                    || key.modifiers.contains(KeyModifiers::ALT)
                {
                    self.insert_char(draft, '\n');
                } else if let Some(command) = parse_slash_command(draft) {
                    draft.clear();
                    self.cursor_position = 0;
                    return ConversationResult::Command(command);
                } else if !draft.trim().is_empty() {
                    return ConversationResult::Submitted;
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ConversationResult::None;
                }
                self.insert_char(draft, c);
            }
            KeyCode::Backspace => {
                if self.cursor_position > 0 {
                    self.cursor_position -= 1;
                    let byte_pos = char_to_byte_index(draft, self.cursor_position);
                    draft.remove(byte_pos);
                }
            }
            KeyCode::Delete => {
                if self.cursor_position < draft.chars().count() {
                    let byte_pos = char_to_byte_index(draft, self.cursor_position);
                    draft.remove(byte_pos);
                }
            }
            KeyCode::Left => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                self.cursor_position = (self.cursor_position + 1).min(draft.chars().count());
            }
            KeyCode::Home => {
                self.cursor_position = 0;
            }
            KeyCode::End => {
                self.cursor_position = draft.chars().count();
            }
            _ => {}
        }

        ConversationResult::None
    }

    /// Insert pasted text at the cursor
    pub fn paste(&mut self, draft: &mut String, text: &str) {
        self.clamp(draft);
        let byte_pos = char_to_byte_index(draft, self.cursor_position);
        draft.insert_str(byte_pos, text);
        self.cursor_position += text.chars().count();
    }

    /// Insert a character at the cursor position
    fn insert_char(&mut self, draft: &mut String, c: char) {
        let byte_pos = char_to_byte_index(draft, self.cursor_position);
        draft.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// The draft may have been cleared behind our back (after a submit)
    fn clamp(&mut self, draft: &str) {
        self.cursor_position = self.cursor_position.min(draft.chars().count());
    }
}

/// Renders the draft with a cursor, or a placeholder when empty
pub struct ComposerView<'a> {
    pub draft: &'a str,
    pub cursor_position: usize,
    pub placeholder: &'a str,
    pub title: &'a str,
    pub has_focus: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title)
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.draft.is_empty() {
            let mut spans = Vec::new();
            if self.has_focus {
                spans.push(Span::raw("▌"));
            }
            spans.push(Span::styled(self.placeholder, Style::default().fg(Color::DarkGray)));
            buf.set_line(inner_area.x, inner_area.y, &Line::from(spans), inner_area.width);
            return;
        }

        let mut content = self.draft.to_string();
        if self.has_focus {
            let byte_pos = char_to_byte_index(&content, self.cursor_position);
            content.insert(byte_pos, '▌');
        }

        // Keep the line with the cursor visible when the draft is taller than the box
        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner_area.height as usize;
        let cursor_line = lines.iter().position(|l| l.contains('▌')).unwrap_or(lines.len() - 1);
        let start = (cursor_line + 1).saturating_sub(height);

        for (i, line_text) in lines.iter().skip(start).take(height).enumerate() {
            let line = Line::from(vec![Span::raw(*line_text)]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}
