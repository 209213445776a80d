use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::error::CompletionError;
use crate::session::PendingRequest;

/// Events consumed by the application loop.
///
/// Terminal input, the animation tick and finished completions all arrive
/// through the same channel so the session is only ever touched from one place.
#[derive(Debug)]
pub enum AppEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Periodic tick for animations and the copy badge timer
    Tick,

    /// The outstanding completion request finished
    Completion {
        request: PendingRequest,
        outcome: Result<String, CompletionError>,
    },
}

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ChatRole::User => "👤",
            ChatRole::Assistant => "🤖",
        }
    }
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No usable credential yet, or the credential prompt is open
    Unconfigured,
    /// Credential present, composer enabled
    Configured,
    /// One request outstanding, submission disabled
    Sending,
}

impl SessionPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionPhase::Unconfigured => "Setup",
            SessionPhase::Configured => "Ready",
            SessionPhase::Sending => "Sending",
        }
    }
}
