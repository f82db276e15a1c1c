use shepherd_types::Purpose;

/// Parsed command-line invocation. Built by hand over `std::env::args` —
/// the flag grammar is small and flat enough that a dependency buys
/// nothing a `while let` loop doesn't already give us.
#[derive(Debug, Default)]
pub struct Args {
    pub session: Option<String>,
    pub dev: bool,
    pub heartbeat: bool,
    pub system: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub yes: bool,
    pub json: bool,

    pub tool: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub overwrite: bool,

    pub toolloop: bool,
    pub max_steps: u32,
    pub max_tool_calls: u32,
    pub max_output_tokens: u32,

    pub list_sessions: bool,
    pub export_session: Option<String>,
    pub delete_session: Option<String>,
    pub prune_sessions: Option<i64>,

    pub prompt: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    #[error("flag {0} requires a value")]
    MissingValue(String),
    #[error("flag {0} requires an integer value: {1}")]
    InvalidInteger(String, String),
}

impl Args {
    pub fn purpose(&self) -> Purpose {
        if self.heartbeat {
            Purpose::Heartbeat
        } else if self.dev {
            Purpose::Dev
        } else {
            Purpose::Default
        }
    }

    pub fn parse(raw: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = Args {
            max_steps: 8,
            max_tool_calls: 16,
            max_output_tokens: 1024,
            ..Args::default()
        };
        let mut remaining: Vec<String> = raw.collect();
        let mut positional = Vec::new();

        while let Some(flag) = remaining.first().cloned() {
            remaining.remove(0);
            match flag.as_str() {
                "--session" => args.session = Some(take(&flag, &mut remaining)?),
                "--dev" => args.dev = true,
                "--heartbeat" => args.heartbeat = true,
                "--system" => args.system = Some(take(&flag, &mut remaining)?),
                "--provider" => args.provider = Some(take(&flag, &mut remaining)?),
                "--model" => args.model = Some(take(&flag, &mut remaining)?),
                "--yes" => args.yes = true,
                "--json" => args.json = true,

                "--tool" => args.tool = Some(take(&flag, &mut remaining)?),
                "--path" => args.path = Some(take(&flag, &mut remaining)?),
                "--content" => args.content = Some(take(&flag, &mut remaining)?),
                "--overwrite" => args.overwrite = true,

                "--toolloop" => args.toolloop = true,
                "--steps" | "--maxSteps" => args.max_steps = take_u32(&flag, &mut remaining)?,
                "--maxToolCalls" => args.max_tool_calls = take_u32(&flag, &mut remaining)?,
                "--maxOutputTokens" => args.max_output_tokens = take_u32(&flag, &mut remaining)?,

                "--list-sessions" => args.list_sessions = true,
                "--export" => args.export_session = Some(take(&flag, &mut remaining)?),
                "--delete-session" => args.delete_session = Some(take(&flag, &mut remaining)?),
                "--prune-older-than" => {
                    let raw = take(&flag, &mut remaining)?;
                    args.prune_sessions = Some(
                        raw.parse()
                            .map_err(|_| ArgsError::InvalidInteger(flag.clone(), raw))?,
                    );
                }

                other if other.starts_with("--") => return Err(ArgsError::UnknownFlag(other.into())),
                other => positional.push(other.to_string()),
            }
        }

        if !positional.is_empty() {
            args.prompt = Some(positional.join(" "));
        }

        Ok(args)
    }
}

fn take(flag: &str, remaining: &mut Vec<String>) -> Result<String, ArgsError> {
    if remaining.is_empty() {
        return Err(ArgsError::MissingValue(flag.to_string()));
    }
    Ok(remaining.remove(0))
}

fn take_u32(flag: &str, remaining: &mut Vec<String>) -> Result<u32, ArgsError> {
    let raw = take(flag, remaining)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidInteger(flag.to_string(), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_manual_tool_invocation() {
        let args = Args::parse(
            ["--tool", "list_dir", "--path", "notes", "--yes"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(args.tool.as_deref(), Some("list_dir"));
        assert_eq!(args.path.as_deref(), Some("notes"));
        assert!(args.yes);
    }

    #[test]
    fn positional_words_become_the_prompt() {
        let args = Args::parse(
            ["--toolloop", "summarize", "the", "notes"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(args.prompt.as_deref(), Some("summarize the notes"));
        assert!(args.toolloop);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Args::parse(["--bogus"].into_iter().map(String::from)).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownFlag(_)));
    }

    #[test]
    fn dev_and_heartbeat_select_purpose() {
        let args = Args::parse(["--dev"].into_iter().map(String::from)).unwrap();
        assert_eq!(args.purpose(), Purpose::Dev);
        let args = Args::parse(["--heartbeat"].into_iter().map(String::from)).unwrap();
        assert_eq!(args.purpose(), Purpose::Heartbeat);
    }
}
