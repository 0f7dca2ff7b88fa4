use console::style;

use crate::providers::gitlab::TerminalStatus;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Green for success, red for failure, yellow for a canceled pipeline
pub fn for_terminal_status(
    status: TerminalStatus,
    text: impl std::fmt::Display,
) -> console::StyledObject<String> {
    match status {
        TerminalStatus::Succeeded => bright_green(text),
        TerminalStatus::Failed => bright_red(text),
        TerminalStatus::Canceled => bright_yellow(text),
    }
}
