pub const HELP_TEXT: &str = "Commands: /help, /clear, /new, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    /// Drop the transcript, keep the session.
    Clear,
    /// Start a fresh session and drop the transcript.
    New,
    Quit,
    Unknown(String),
}

/// Parse a `/command`. Arguments after the command name are ignored.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let name = input.split_whitespace().next()?;
    if !name.starts_with('/') {
        return None;
    }

    Some(match name {
        "/help" | "/?" => SlashCommand::Help,
        "/clear" => SlashCommand::Clear,
        "/new" => SlashCommand::New,
        "/quit" | "/exit" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other.to_string()),
    })
}
