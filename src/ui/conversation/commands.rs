use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Copy a message to the clipboard
    Copy,
    /// Enter a different API key and start over
    Key,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 1-based message number given to `/copy`, as a 0-based index
    pub fn copy_target(&self) -> Option<usize> {
        if self.command != SlashCommand::Copy {
            return None;
        }

        let n: usize = self.argument()?.trim().parse().ok()?;
        n.checked_sub(1)
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Copy => "copy message n (default: the selected or last one)",
            SlashCommand::Key => "enter a new API key and clear the conversation",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let tail: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head).ok().or_else(|| match head.as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "y" | "yank" => Some(SlashCommand::Copy),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    // Only /copy takes an argument; anything else with trailing text is a message
    let argument = if tail.is_empty() {
        None
    } else if command == SlashCommand::Copy {
        Some(tail.join(" "))
    } else {
        return None;
    };

    Some(ParsedCommand { command, argument })
}

/// One-line help for the status bar
pub fn get_help_text() -> String {
    let commands: Vec<String> = SlashCommand::iter()
        .map(|c| format!("/{} {}", c.command(), c.description()))
        .collect();
    format!(
        "{} | Alt+↑/↓ select, Ctrl+Y copy, Ctrl+K new key, Ctrl+C quit",
        commands.join(" · ")
    )
}
