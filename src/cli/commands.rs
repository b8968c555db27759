use crate::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Mode(Option<Mode>),
    Modes,
    Upload { paths: Vec<String> },
    Files,
    Analyze,
    History(Option<usize>),
    New,
    Trace,
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

pub(crate) const HELP_TEXT: &str = "Available commands:\n  /help                Show this command list\n  /mode [name]         Show or switch the assistant mode\n  /modes               List assistant modes\n  /upload <path>...    Attach files to this session\n  /files               List attached files\n  /analyze             Ask the assistant to review all attached files\n  /history [n]         Show the conversation (or its last n messages)\n  /new                 Start a new chat session\n  /trace               Show path to the current trace file\n  exit | quit          Leave";

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    if !line.starts_with('/') {
        return Err(ParseError::new("not a command"));
    }

    let trimmed = line.trim();
    let mut parts = trimmed[1..].splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "mode" => parse_mode(rest),
        "modes" => expect_no_args(rest, Command::Modes, "usage: /modes"),
        "upload" => parse_upload(rest),
        "files" => expect_no_args(rest, Command::Files, "usage: /files"),
        "analyze" => expect_no_args(rest, Command::Analyze, "usage: /analyze"),
        "history" => parse_history(rest),
        "new" => expect_no_args(rest, Command::New, "usage: /new"),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        _ => Err(ParseError::new(format!("unknown command '/{name}'. Try /help"))),
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

fn parse_mode(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::Mode(None));
    }

    rest.parse::<Mode>()
        .map(|mode| Command::Mode(Some(mode)))
        .map_err(|reason| ParseError::new(format!("{reason}. Try /modes")))
}

fn parse_upload(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::new("missing file argument. usage: /upload <path>..."));
    }

    Ok(Command::Upload {
        paths: rest.split_whitespace().map(ToOwned::to_owned).collect(),
    })
}

fn parse_history(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::History(None));
    }

    let value = rest
        .parse::<usize>()
        .map_err(|_| ParseError::new("usage: /history [n]"))?;
    if value == 0 {
        return Err(ParseError::new("usage: /history [n] (n must be >= 1)"));
    }

    Ok(Command::History(Some(value)))
}
