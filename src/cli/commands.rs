#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Clear,
    History(Option<usize>),
    Trace,
    Find { query: String },
    Pick(usize),
    Reload,
    Files,
    Model,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) const HELP_TEXT: &str = "Available commands:\n  /help                Show this command list\n  /clear               Forget the conversation and clear the timeline\n  /history [n]         Show the conversation so far (or the last n messages)\n  /trace               Show path to the current trace file\n  /find <query>        Filter the directory panel\n  /pick <n>            Copy the question for directory entry n into the input\n  /reload              Re-read the instructions and knowledge files\n  /files               Show the loaded context files\n  /model               Show model, temperature and prompt settings\n  /quit                Exit GroundChat";

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    if !is_command_line(line) {
        return Err(ParseError::new("not a command"));
    }

    let trimmed = line.trim();
    let command_text = &trimmed[1..];
    let mut parts = command_text.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "clear" => expect_no_args(rest, Command::Clear, "usage: /clear"),
        "history" => parse_history(rest),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        "find" => parse_required_text_arg(rest, "usage: /find <query>")
            .map(|query| Command::Find { query }),
        "pick" => parse_pick(rest),
        "reload" => expect_no_args(rest, Command::Reload, "usage: /reload"),
        "files" => expect_no_args(rest, Command::Files, "usage: /files"),
        "model" => expect_no_args(rest, Command::Model, "usage: /model"),
        "quit" | "exit" => expect_no_args(rest, Command::Quit, "usage: /quit"),
        _ => Err(ParseError::new(format!(
            "unknown command '/{name}'. Try /help"
        ))),
    }
}

pub(crate) fn is_command_line(line: &str) -> bool {
    line.starts_with('/')
}

fn expect_no_args(rest: &str, command: Command, usage: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage))
    }
}

fn parse_history(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::History(None));
    }

    parse_positive(rest, "usage: /history [n]").map(|n| Command::History(Some(n)))
}

fn parse_pick(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::new("missing entry number. usage: /pick <n>"));
    }

    parse_positive(rest, "usage: /pick <n>").map(Command::Pick)
}

fn parse_positive(rest: &str, usage: &str) -> Result<usize, ParseError> {
    let value = rest
        .parse::<usize>()
        .map_err(|_| ParseError::new(usage))?;
    if value == 0 {
        return Err(ParseError::new(format!("{usage} (n must be >= 1)")));
    }
    Ok(value)
}

fn parse_required_text_arg(rest: &str, usage: &str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::new(usage));
    }
    Ok(rest.to_string())
}
