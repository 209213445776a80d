//! Conversation state and the operations the user drives it with.
//!
//! A submission is split in two so the network call can run off the UI loop:
//! [`ConversationSession::begin_submit`] validates and records the user turn,
//! [`ConversationSession::finish_submit`] records whatever came back.
//! [`ConversationSession::submit`] chains both for callers that can simply await.

use crate::clipboard::ClipboardSink;
use crate::error::CompletionError;
use crate::events::{ChatRole, SessionPhase};
use crate::llm::{CompletionBackend, TranscriptEntry};
use chrono::{DateTime, Local};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Opaque, time-ordered message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single message in the conversation. Never changes after creation.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    role: ChatRole,
    content: String,
    created_at: DateTime<Local>,
}

impl Message {
    fn new(role: ChatRole, content: String) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content,
            created_at: Local::now(),
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    fn to_transcript_entry(&self) -> TranscriptEntry {
        TranscriptEntry {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A submitted turn waiting for its reply
#[derive(Debug, Clone)]
pub struct PendingRequest {
    epoch: u64,
    transcript: Vec<TranscriptEntry>,
}

impl PendingRequest {
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }
}

#[derive(Debug, Clone)]
struct CopiedMarker {
    id: MessageId,
    since: Instant,
}

/// Everything the conversation screen knows about the current chat
#[derive(Debug)]
pub struct ConversationSession {
    messages: Vec<Message>,
    draft: String,
    credential: String,
    /// Last credential the user confirmed, restored when setup is cancelled
    confirmed_credential: Option<String>,
    /// Epoch of the outstanding request, if any
    in_flight: Option<u64>,
    credential_setup_visible: bool,
    copied: Option<CopiedMarker>,
    copy_feedback: Duration,
    /// Bumped on every credential reset; replies from an older epoch are dropped
    epoch: u64,
}

impl ConversationSession {
    /// A fresh session waiting for a credential
    pub fn new(copy_feedback: Duration) -> Self {
        Self {
            messages: Vec::new(),
            draft: String::new(),
            credential: String::new(),
            confirmed_credential: None,
            in_flight: None,
            credential_setup_visible: true,
            copied: None,
            copy_feedback,
            epoch: 0,
        }
    }

    /// A session that starts out configured with `credential`.
    ///
    /// A blank credential leaves the setup prompt open.
    pub fn with_credential(copy_feedback: Duration, credential: impl Into<String>) -> Self {
        let mut session = Self::new(copy_feedback);
        session.credential = credential.into();
        session.confirm_credential();
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn credential_mut(&mut self) -> &mut String {
        &mut self.credential
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the outstanding request will land in this conversation.
    ///
    /// False while a request from before the last credential reset is
    /// still running.
    pub fn awaiting_reply(&self) -> bool {
        self.in_flight == Some(self.epoch)
    }

    pub fn credential_setup_visible(&self) -> bool {
        self.credential_setup_visible
    }

    pub fn copied_id(&self) -> Option<&MessageId> {
        self.copied.as_ref().map(|c| &c.id)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.credential_setup_visible || !self.has_credential() {
            SessionPhase::Unconfigured
        } else if self.in_flight.is_some() {
            SessionPhase::Sending
        } else {
            SessionPhase::Configured
        }
    }

    fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    /// Whether pressing send would do anything right now
    pub fn can_submit(&self) -> bool {
        self.phase() == SessionPhase::Configured && !self.draft.trim().is_empty()
    }

    /// Close the credential prompt. Refused while the credential is blank.
    pub fn confirm_credential(&mut self) -> bool {
        if !self.has_credential() {
            return false;
        }
        self.credential_setup_visible = false;
        self.confirmed_credential = Some(self.credential.clone());
        info!("credential configured");
        true
    }

    /// Close the credential prompt without changing the credential.
    ///
    /// Restores the last confirmed credential. Returns `false`, leaving the
    /// prompt open, when no credential was ever confirmed.
    pub fn cancel_credential_setup(&mut self) -> bool {
        let Some(confirmed) = self.confirmed_credential.clone() else {
            return false;
        };
        self.credential = confirmed;
        self.credential_setup_visible = false;
        debug!("credential setup cancelled");
        true
    }

    /// Record the user's turn and hand back the request to send.
    ///
    /// Returns `None`, changing nothing, when the draft is blank, there is no
    /// credential, or a request is already outstanding.
    pub fn begin_submit(&mut self) -> Option<PendingRequest> {
        if !self.can_submit() {
            debug!(phase = ?self.phase(), "submit ignored");
            return None;
        }

        let content = std::mem::take(&mut self.draft);
        self.messages.push(Message::new(ChatRole::User, content));
        self.in_flight = Some(self.epoch);

        let transcript = self
            .messages
            .iter()
            .map(Message::to_transcript_entry)
            .collect::<Vec<_>>();

        debug!(turns = transcript.len(), "submitting conversation");
        Some(PendingRequest {
            epoch: self.epoch,
            transcript,
        })
    }

    /// Record the outcome of a request started by [`Self::begin_submit`].
    pub fn finish_submit(
        &mut self,
        request: PendingRequest,
        outcome: Result<String, CompletionError>,
    ) {
        self.in_flight = None;

        if request.epoch != self.epoch {
            debug!("dropping reply from a reset session");
            return;
        }

        let content = match outcome {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "completion failed");
                err.to_chat_text()
            }
        };
        self.messages.push(Message::new(ChatRole::Assistant, content));
    }

    /// Submit the current draft and wait for the reply.
    pub async fn submit<B: CompletionBackend>(&mut self, backend: &B) {
        let Some(request) = self.begin_submit() else {
            return;
        };
        let outcome = backend.complete(&self.credential, request.transcript()).await;
        self.finish_submit(request, outcome);
    }

    /// Put a message on the clipboard and flag it as copied.
    ///
    /// Returns whether the id was found. Clipboard failures are only logged.
    pub fn copy<C: ClipboardSink + ?Sized>(
        &mut self,
        id: &MessageId,
        clipboard: &mut C,
        now: Instant,
    ) -> bool {
        let Some(message) = self.messages.iter().find(|m| m.id() == id) else {
            return false;
        };

        if let Err(err) = clipboard.set_text(message.content()) {
            warn!(error = %err, "copy to clipboard failed");
        }

        self.copied = Some(CopiedMarker {
            id: id.clone(),
            since: now,
        });
        true
    }

    /// Clear the copied flag once its display window has passed.
    ///
    /// Returns whether anything was cleared.
    pub fn expire_copied(&mut self, now: Instant) -> bool {
        match &self.copied {
            Some(marker) if now.saturating_duration_since(marker.since) >= self.copy_feedback => {
                self.copied = None;
                true
            }
            _ => false,
        }
    }

    /// Reopen the credential prompt and discard the conversation.
    pub fn reset_credential(&mut self) {
        self.credential_setup_visible = true;
        self.messages.clear();
        self.copied = None;
        self.epoch += 1;
        info!(in_flight = self.in_flight.is_some(), "credential reset, conversation cleared");
    }
}
