pub mod conversation;

use crate::events::SessionPhase;
use crate::llm::CompletionBackend;
use conversation::{ComposerView, ConversationManager, CredentialView, HistoryView};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Draw the whole screen for the current state
pub fn render<B>(manager: &ConversationManager<B>, frame: &mut Frame)
where
    B: CompletionBackend + Clone + 'static,
{
    let session = manager.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // History
            Constraint::Length(5), // Composer
            Constraint::Length(1), // Status
        ])
        .split(frame.size());

    frame.render_widget(
        HistoryView {
            messages: session.messages(),
            copied: session.copied_id(),
            selected: manager.selected(),
            thinking_frame: session.awaiting_reply().then(|| manager.animation_frame()),
        },
        chunks[0],
    );

    let setup = session.credential_setup_visible();
    frame.render_widget(
        ComposerView {
            draft: session.draft(),
            cursor_position: manager.composer().cursor_position(),
            placeholder: "Type your message...",
            title: manager.composer_title(),
            has_focus: !setup,
        },
        chunks[1],
    );

    frame.render_widget(status_line(manager), chunks[2]);

    if setup {
        frame.render_widget(
            CredentialView {
                credential: session.credential(),
                endpoint: manager.endpoint(),
                rejected: manager.credential_rejected(),
            },
            frame.size(),
        );
    }
}

fn status_line<B>(manager: &ConversationManager<B>) -> Paragraph<'static>
where
    B: CompletionBackend + Clone + 'static,
{
    let phase = manager.session().phase();
    let phase_color = match phase {
        SessionPhase::Unconfigured => Color::Yellow,
        SessionPhase::Configured => Color::Green,
        SessionPhase::Sending => Color::Cyan,
    };

    let detail = manager
        .status()
        .map(str::to_string)
        .unwrap_or_else(|| "/help for commands · Ctrl+C to quit".to_string());

    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", phase.display_name()),
            Style::default().fg(Color::Black).bg(phase_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", manager.model()), Style::default().fg(Color::Magenta)),
        Span::styled(detail, Style::default().fg(Color::DarkGray)),
    ]))
}
