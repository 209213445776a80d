//! Conversation UI components for chat interface

pub mod commands;
pub mod composer;
pub mod credential;
pub mod history;
pub mod manager;

pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::{ComposerView, ConversationComposer, ConversationResult};
pub use credential::CredentialView;
pub use history::HistoryView;
pub use manager::ConversationManager;
