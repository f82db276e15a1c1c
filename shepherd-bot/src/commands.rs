use teloxide::utils::command::BotCommands;

/// Slash commands the bot recognizes. Anything else that starts with `/`
/// and does not parse here is treated as unknown; anything that does not
/// start with `/` is a plain turn for the scheduler.
#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    /// Greeting and a one-line description of the bot.
    #[command(description = "show the welcome message")]
    Start,
    /// Same content as `/start`.
    #[command(description = "show this help message")]
    Help,
    /// Report this chat's id and the session id it maps to.
    #[command(description = "show this chat's id and session id")]
    Id,
    /// Delete this chat's session document, starting fresh next turn.
    #[command(description = "forget this chat's conversation history")]
    Reset,
    /// Run one turn under the elevated `dev` purpose. Restricted to admins.
    #[command(description = "run a turn with elevated (dev) permissions")]
    Dev(String),
}
