use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "codemate")]
#[command(
    about = "Terminal coding assistant backed by Gemini",
    long_about = "Terminal coding assistant backed by Gemini\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/codemate/config.toml\n    2. ~/.config/codemate/config.toml\n\nThe API key is read from GEMINI_API_KEY (or GOOGLE_API_KEY), a .env file, or the config file."
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Start in this assistant mode, e.g. "debugger" or "Code Analysis".
    /// Unknown names fall back to General.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Attach a file to the session before the first prompt. Repeatable.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Ask one question, print the reply, and exit. Attached files are only
    /// sent by --analyze, so --file is rejected here.
    #[arg(long, value_name = "PROMPT", conflicts_with_all = ["analyze", "files"])]
    pub ask: Option<String>,

    /// Analyze the attached files once and exit.
    #[arg(long, requires = "files")]
    pub analyze: bool,

    /// Print HTTP traffic (with secrets masked) to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}
