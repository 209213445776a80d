use crate::clipboard::ClipboardSink;
use crate::config::Config;
use crate::events::{AppEvent, SessionPhase};
use crate::llm::CompletionBackend;
use crate::session::ConversationSession;
use crate::ui::conversation::{
    get_help_text, ConversationComposer, ConversationResult, ParsedCommand, SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Routes terminal events to the session and runs the one outstanding request
pub struct ConversationManager<B> {
    session: ConversationSession,
    composer: ConversationComposer,
    backend: B,
    clipboard: Box<dyn ClipboardSink>,
    events: mpsc::UnboundedSender<AppEvent>,
    model: String,
    endpoint: String,
    selected: Option<usize>,
    status: Option<String>,
    credential_rejected: bool,
    animation_frame: u8,
    should_quit: bool,
}

impl<B> ConversationManager<B>
where
    B: CompletionBackend + Clone + 'static,
{
    pub fn new(
        session: ConversationSession,
        backend: B,
        clipboard: Box<dyn ClipboardSink>,
        events: mpsc::UnboundedSender<AppEvent>,
        config: &Config,
    ) -> Self {
        Self {
            session,
            composer: ConversationComposer::new(),
            backend,
            clipboard,
            events,
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            selected: None,
            status: None,
            credential_rejected: false,
            animation_frame: 0,
            should_quit: false,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn credential_rejected(&self) -> bool {
        self.credential_rejected
    }

    pub fn animation_frame(&self) -> u8 {
        self.animation_frame
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Key(key) => self.handle_key(key, now),
            AppEvent::Paste(text) => self.handle_paste(&text),
            AppEvent::Resize(_, _) => {}
            AppEvent::Tick => self.tick(now),
            AppEvent::Completion { request, outcome } => {
                self.session.finish_submit(request, outcome);
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        if self.session.awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.session.expire_copied(now);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.session.credential_setup_visible() {
            self.handle_credential_key(key);
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('k') if ctrl => self.reset_credential(),
            KeyCode::Char('y') if ctrl => self.copy(self.selected, now),
            KeyCode::Up if alt => self.move_selection(-1),
            KeyCode::Down if alt => self.move_selection(1),
            KeyCode::Esc => self.selected = None,
            _ => match self.composer.handle_key(key, self.session.draft_mut()) {
                ConversationResult::Submitted => self.submit(),
                ConversationResult::Command(command) => self.handle_slash_command(command, now),
                ConversationResult::None => {}
            },
        }
    }

    fn handle_credential_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let confirmed = self.session.confirm_credential();
                self.credential_rejected = !confirmed;
                if confirmed {
                    self.status = None;
                }
            }
            KeyCode::Esc => {
                if !self.session.cancel_credential_setup() {
                    self.should_quit = true;
                }
                self.credential_rejected = false;
            }
            KeyCode::Backspace => {
                self.session.credential_mut().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.session.credential_mut().push(c);
                self.credential_rejected = false;
            }
            _ => {}
        }
    }

    fn handle_paste(&mut self, text: &str) {
        if self.session.credential_setup_visible() {
            self.session.credential_mut().push_str(text.trim());
            self.credential_rejected = false;
        } else {
            self.composer.paste(self.session.draft_mut(), text);
        }
    }

    /// Start a request for the current draft; ignored while one is outstanding
    fn submit(&mut self) {
        let Some(request) = self.session.begin_submit() else {
            return;
        };
        self.selected = None;
        self.status = None;

        let backend = self.backend.clone();
        let credential = self.session.credential().to_string();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = backend.complete(&credential, request.transcript()).await;
            if events.send(AppEvent::Completion { request, outcome }).is_err() {
                debug!("event loop gone, dropping completion");
            }
        });
    }

    fn reset_credential(&mut self) {
        self.session.reset_credential();
        self.selected = None;
        self.credential_rejected = false;
        self.status = None;
    }

    /// Copy the message at `index`, or the last one
    fn copy(&mut self, index: Option<usize>, now: Instant) {
        let messages = self.session.messages();
        let Some(message) = index
            .or_else(|| messages.len().checked_sub(1))
            .and_then(|i| messages.get(i))
        else {
            self.status = Some("Nothing to copy".to_string());
            return;
        };

        let id = message.id().clone();
        self.session.copy(&id, self.clipboard.as_mut(), now);
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.session.messages().len();
        if len == 0 {
            self.selected = None;
            return;
        }

        let current = self.selected.unwrap_or(len) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected = Some(next as usize);
    }

    fn handle_slash_command(&mut self, command: ParsedCommand, now: Instant) {
        match command.command {
            SlashCommand::Copy => {
                if command.argument().is_some() && command.copy_target().is_none() {
                    self.status = Some("Usage: /copy [message number]".to_string());
                    return;
                }
                let target = command.copy_target().or(self.selected);
                if let Some(index) = target {
                    if index >= self.session.messages().len() {
                        self.status = Some(format!("No message #{}", index + 1));
                        return;
                    }
                }
                self.copy(target, now);
            }
            SlashCommand::Key => self.reset_credential(),
            SlashCommand::Help => self.status = Some(get_help_text()),
            SlashCommand::Quit => {
                info!("quit requested");
                self.should_quit = true;
            }
        }
    }

    /// Composer title reflecting whether sending is possible
    pub fn composer_title(&self) -> &'static str {
        match self.session.phase() {
            SessionPhase::Sending => "✉ Waiting for reply...",
            _ => "✉ Message (Enter to send)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use crate::events::ChatRole;
    use crate::llm::TranscriptEntry;
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    struct EchoBackend {
        fail_with: Option<CompletionError>,
    }

    impl CompletionBackend for EchoBackend {
        fn complete(
            &self,
            _credential: &str,
            transcript: &[TranscriptEntry],
        ) -> impl Future<Output = Result<String, CompletionError>> + Send {
            let outcome = match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(format!(
                    "echo: {}",
                    transcript.last().map(|t| t.content.as_str()).unwrap_or("")
                )),
            };
            std::future::ready(outcome)
        }
    }

    #[derive(Clone, Default)]
    struct SharedClipboard(Arc<Mutex<Vec<String>>>);

    impl ClipboardSink for SharedClipboard {
        fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        manager: ConversationManager<EchoBackend>,
        rx: mpsc::UnboundedReceiver<AppEvent>,
        clipboard: SharedClipboard,
    }

    fn harness(backend: EchoBackend, credential: Option<&str>) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config::default();
        let session = match credential {
            Some(key) => ConversationSession::with_credential(config.copy_feedback(), key),
            None => ConversationSession::new(config.copy_feedback()),
        };
        let clipboard = SharedClipboard::default();
        let manager = ConversationManager::new(
            session,
            backend,
            Box::new(clipboard.clone()),
            tx,
            &config,
        );
        Harness { manager, rx, clipboard }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    impl Harness {
        fn send(&mut self, event: AppEvent) {
            self.manager.handle_event(event, Instant::now());
        }

        fn type_str(&mut self, text: &str) {
            for c in text.chars() {
                self.send(key(KeyCode::Char(c)));
            }
        }

        async fn deliver_completion(&mut self) {
            let event = self.rx.recv().await.expect("completion event");
            assert!(matches!(event, AppEvent::Completion { .. }));
            self.send(event);
        }
    }

    #[tokio::test]
    async fn credential_then_chat_round_trip() {
        let mut h = harness(EchoBackend { fail_with: None }, None);
        assert_eq!(h.manager.session().phase(), SessionPhase::Unconfigured);

        h.send(key(KeyCode::Enter));
        assert!(h.manager.credential_rejected());

        h.type_str("sk-or-1");
        h.send(key(KeyCode::Enter));
        assert_eq!(h.manager.session().phase(), SessionPhase::Configured);

        h.type_str("hello");
        h.send(key(KeyCode::Enter));
        assert!(h.manager.session().in_flight());
        assert!(h.manager.session().draft().is_empty());

        h.deliver_completion().await;

        let messages = h.manager.session().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content(), "hello");
        assert_eq!(messages[1].role(), ChatRole::Assistant);
        assert_eq!(messages[1].content(), "echo: hello");
        assert!(!h.manager.session().in_flight());
    }

    #[tokio::test]
    async fn enter_is_disabled_while_sending() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));
        h.type_str("first");
        h.send(key(KeyCode::Enter));
        h.type_str("second");
        h.send(key(KeyCode::Enter));

        assert_eq!(h.manager.session().messages().len(), 1);
        assert_eq!(h.manager.session().draft(), "second");

        h.deliver_completion().await;
        assert_eq!(h.manager.session().messages().len(), 2);

        h.send(key(KeyCode::Enter));
        h.deliver_completion().await;
        assert_eq!(h.manager.session().messages().len(), 4);
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failures_show_up_as_error_bubbles() {
        let mut h = harness(
            EchoBackend {
                fail_with: Some(CompletionError::Api {
                    status: 401,
                    message: "Invalid API key".to_string(),
                }),
            },
            Some("bad"),
        );
        h.type_str("hi");
        h.send(key(KeyCode::Enter));
        h.deliver_completion().await;

        assert_eq!(
            h.manager.session().messages()[1].content(),
            "Error: Invalid API key"
        );
    }

    #[tokio::test]
    async fn ctrl_y_copies_last_message_and_tick_clears_badge() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));
        h.type_str("ping");
        h.send(key(KeyCode::Enter));
        h.deliver_completion().await;

        let start = Instant::now();
        h.manager.handle_event(ctrl('y'), start);
        assert_eq!(*h.clipboard.0.lock().unwrap(), vec!["echo: ping".to_string()]);
        let last_id = h.manager.session().messages()[1].id().clone();
        assert_eq!(h.manager.session().copied_id(), Some(&last_id));

        h.manager.handle_event(AppEvent::Tick, start + Duration::from_millis(500));
        assert!(h.manager.session().copied_id().is_some());

        h.manager.handle_event(AppEvent::Tick, start + Duration::from_secs(2));
        assert!(h.manager.session().copied_id().is_none());
    }

    #[tokio::test]
    async fn selection_and_copy_command() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));
        h.type_str("ping");
        h.send(key(KeyCode::Enter));
        h.deliver_completion().await;

        h.send(AppEvent::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::ALT)));
        assert_eq!(h.manager.selected(), Some(1));
        h.send(AppEvent::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::ALT)));
        h.send(AppEvent::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::ALT)));
        assert_eq!(h.manager.selected(), Some(0));

        h.send(ctrl('y'));
        assert_eq!(*h.clipboard.0.lock().unwrap(), vec!["ping".to_string()]);

        h.type_str("/copy 2");
        h.send(key(KeyCode::Enter));
        assert_eq!(h.clipboard.0.lock().unwrap().last().unwrap(), "echo: ping");

        h.type_str("/copy 9");
        h.send(key(KeyCode::Enter));
        assert_eq!(h.manager.status(), Some("No message #9"));
        assert_eq!(h.clipboard.0.lock().unwrap().len(), 2);
        assert_eq!(h.manager.session().messages().len(), 2);
    }

    #[tokio::test]
    async fn ctrl_k_resets_even_while_sending() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));
        h.type_str("question");
        h.send(key(KeyCode::Enter));

        h.send(ctrl('k'));
        assert!(h.manager.session().credential_setup_visible());
        assert!(h.manager.session().messages().is_empty());

        h.deliver_completion().await;
        assert!(h.manager.session().messages().is_empty());
        assert!(!h.manager.session().in_flight());

        // Previous key is kept for editing; Enter confirms it again
        h.send(key(KeyCode::Enter));
        assert_eq!(h.manager.session().phase(), SessionPhase::Configured);
    }

    #[tokio::test]
    async fn slash_commands_help_key_quit() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));

        h.type_str("/help");
        h.send(key(KeyCode::Enter));
        assert!(h.manager.status().unwrap().contains("/key"));
        assert!(h.manager.session().messages().is_empty());

        h.type_str("/key");
        h.send(key(KeyCode::Enter));
        assert!(h.manager.session().credential_setup_visible());

        h.send(key(KeyCode::Enter));
        h.type_str("/quit");
        h.send(key(KeyCode::Enter));
        assert!(h.manager.should_quit());
    }

    #[test]
    fn paste_goes_to_the_focused_input() {
        let mut h = harness(EchoBackend { fail_with: None }, None);
        h.send(AppEvent::Paste(" sk-or-pasted\n".to_string()));
        assert_eq!(h.manager.session().credential(), "sk-or-pasted");

        h.send(key(KeyCode::Enter));
        h.send(AppEvent::Paste("line one\nline two".to_string()));
        assert_eq!(h.manager.session().draft(), "line one\nline two");
    }

    #[tokio::test]
    async fn command_word_followed_by_text_is_sent_as_a_message() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));

        h.type_str("/help me write a poem");
        h.send(key(KeyCode::Enter));
        assert!(h.manager.status().is_none());
        h.deliver_completion().await;

        h.type_str("/q uick question");
        h.send(key(KeyCode::Enter));
        assert!(!h.manager.should_quit());
        h.deliver_completion().await;

        let contents: Vec<_> = h.manager.session().messages().iter().map(|m| m.content()).collect();
        assert_eq!(
            contents,
            vec![
                "/help me write a poem",
                "echo: /help me write a poem",
                "/q uick question",
                "echo: /q uick question",
            ]
        );
    }

    #[test]
    fn esc_returns_to_the_conversation_once_a_key_was_confirmed() {
        let mut h = harness(EchoBackend { fail_with: None }, Some("key"));
        h.send(ctrl('k'));
        h.type_str("typo");
        h.send(key(KeyCode::Esc));

        assert!(!h.manager.should_quit());
        assert!(!h.manager.session().credential_setup_visible());
        assert_eq!(h.manager.session().credential(), "key");
    }

    #[test]
    fn esc_quits_when_no_key_was_ever_confirmed() {
        let mut h = harness(EchoBackend { fail_with: None }, None);
        h.send(key(KeyCode::Esc));
        assert!(h.manager.should_quit());
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut h = harness(EchoBackend { fail_with: None }, None);
        h.send(ctrl('c'));
        assert!(h.manager.should_quit());
    }
}
