// File: src/services/commands.rs
//
// Thin prefix-command surface. Parsing only; the server binary wires the
// parsed command to the scheduler.

pub const COMMAND_PREFIX: char = '!';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Run a refresh cycle immediately and reset the interval timer.
    ForceCheck,
}

pub fn parse_command(text: &str) -> Option<BotCommand> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix(COMMAND_PREFIX)?;
    let name = rest.split_whitespace().next()?;
    match name.to_ascii_lowercase().as_str() {
        "forcecheck" | "pingserver" => Some(BotCommand::ForceCheck),
        _ => None,
    }
}

pub fn force_check_ack(seconds_until_next: i64) -> String {
    format!(
        "Forced a server status refresh and reset the timer — next automatic update in ~{seconds_until_next}s."
    )
}
