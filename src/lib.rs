//! Terminal chat client for hosted LLM completion APIs.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod events;
pub mod llm;
pub mod logging;
pub mod session;
pub mod tui;
pub mod ui;
