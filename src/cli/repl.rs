use super::commands::{Command, HELP_TEXT, is_command_line, parse_command};
use super::theme::{Palette, Tone};
use crate::conversation::{self, IngestOutcome, Upload};
use crate::documents::{self, SUPPORTED_EXTENSIONS};
use crate::llm::gemini::GeminiProvider;
use crate::llm::provider::LlmProvider;
use crate::mode::Mode;
use crate::session::{ChatRole, Session};
use crate::trace::SessionTrace;
use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::{Path, PathBuf};

pub(crate) const MISSING_KEY_MESSAGE: &str = "Assistant unavailable: missing GEMINI_API_KEY. Configure it in your shell or .env file (example: GEMINI_API_KEY=your_key).";

pub struct AppState<P = GeminiProvider> {
    pub session: Session,
    pub llm: Option<P>,
    pub trace: SessionTrace,
    pub analysis_prefix_chars: usize,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub tone: Tone,
    pub text: String,
}

impl Output {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    fn info(text: impl Into<String>) -> Self {
        Self::new(Tone::Info, text)
    }

    fn error(text: impl Into<String>) -> Self {
        Self::new(Tone::Error, text)
    }

    fn assistant(text: impl Into<String>) -> Self {
        Self::new(Tone::Assistant, text)
    }
}

pub fn prompt_for(mode: Mode) -> String {
    format!("{}> ", mode.slug())
}

pub fn print_outputs(palette: &Palette, outputs: &[Output]) {
    for output in outputs {
        println!("{}", palette.paint(output.tone, &output.text));
    }
}

pub async fn run_repl<P: LlmProvider>(state: &mut AppState<P>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    print_outputs(
        &state.palette,
        &[
            Output::info(format!(
                "Assistant is running in {} mode. Type /help for commands.",
                state.session.mode()
            )),
            Output::new(
                Tone::Muted,
                format!("Trace: {}", state.trace.file_path().display()),
            ),
        ],
    );
    if state.llm.is_none() {
        print_outputs(&state.palette, &[Output::error(MISSING_KEY_MESSAGE)]);
    }

    loop {
        match rl.readline(&prompt_for(state.session.mode())) {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                let outputs = handle_line(state, line).await;
                print_outputs(&state.palette, &outputs);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    state.trace.log_event("session", "closed");
    Ok(())
}

/// One question, one reply, no REPL. Provider failures become the process
/// error so the exit status reflects them.
pub async fn ask_once<P: LlmProvider>(state: &mut AppState<P>, prompt: &str) -> Result<String> {
    let provider = state.llm.as_ref().ok_or_else(|| anyhow!(MISSING_KEY_MESSAGE))?;
    state.trace.log_user(prompt);

    match conversation::ask(provider, &mut state.session, prompt).await {
        Ok(reply) => {
            state.trace.log_assistant(&reply);
            Ok(reply)
        }
        Err(err) => {
            let message = format!("Assistant request failed: {err}");
            state.trace.log_event("error", &message);
            Err(anyhow!(message))
        }
    }
}

pub async fn analyze_once<P: LlmProvider>(state: &mut AppState<P>) -> Result<String> {
    let provider = state.llm.as_ref().ok_or_else(|| anyhow!(MISSING_KEY_MESSAGE))?;

    match conversation::analyze(provider, &mut state.session, state.analysis_prefix_chars).await {
        Ok(Some(reply)) => {
            state.trace.log_assistant(&reply);
            Ok(reply)
        }
        Ok(None) => Err(anyhow!("No files were attached for analysis")),
        Err(err) => {
            let message = format!("Assistant request failed: {err}");
            state.trace.log_event("error", &message);
            Err(anyhow!(message))
        }
    }
}

/// Reads, filters and ingests files from disk into the session.
pub fn attach_files<P>(state: &mut AppState<P>, paths: &[PathBuf]) -> Vec<Output> {
    let mut outputs = Vec::new();
    let mut uploads = Vec::new();

    for path in paths {
        let name = display_name(path);
        if !documents::is_supported_upload(&name) {
            outputs.push(Output::error(format!(
                "Unsupported file type: {name} (supported: {})",
                SUPPORTED_EXTENSIONS.join(", ")
            )));
            continue;
        }

        match Upload::from_path(path) {
            Ok(upload) => uploads.push(upload),
            Err(err) => {
                outputs.push(Output::error(format!(
                    "Failed to read {}: {err}",
                    path.display()
                )));
            }
        }
    }

    if uploads.is_empty() {
        return outputs;
    }

    let report = conversation::ingest(&mut state.session, uploads);
    for outcome in report.outcomes {
        match outcome {
            IngestOutcome::Extracted { name, chars } => {
                state
                    .trace
                    .log_event("upload", &format!("{name}: {chars} chars"));
                outputs.push(Output::info(format!("Loaded {name} ({chars} chars)")));
            }
            IngestOutcome::Failed { name, placeholder } => {
                state
                    .trace
                    .log_event("upload", &format!("{name}: {placeholder}"));
                outputs.push(Output::error(placeholder));
            }
            IngestOutcome::AlreadyPresent { name } => {
                outputs.push(Output::new(
                    Tone::Muted,
                    format!("{name} is already attached; keeping the first copy"),
                ));
            }
        }
    }
    outputs.push(Output::info(conversation::ready_summary(&state.session)));
    outputs
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) async fn handle_line<P: LlmProvider>(
    state: &mut AppState<P>,
    line: &str,
) -> Vec<Output> {
    if is_command_line(line) {
        state.trace.log_event("command", line);
        return match parse_command(line) {
            Ok(command) => run_command(state, command).await,
            Err(err) => vec![Output::error(err.message())],
        };
    }

    state.trace.log_user(line);
    let Some(provider) = &state.llm else {
        return vec![Output::error(MISSING_KEY_MESSAGE)];
    };

    match conversation::ask(provider, &mut state.session, line).await {
        Ok(reply) => {
            state.trace.log_assistant(&reply);
            vec![Output::assistant(reply)]
        }
        Err(err) => {
            let message = format!("Assistant request failed: {err}");
            state.trace.log_event("error", &message);
            vec![Output::error(message)]
        }
    }
}

async fn run_command<P: LlmProvider>(state: &mut AppState<P>, command: Command) -> Vec<Output> {
    match command {
        Command::Help => vec![Output::info(HELP_TEXT)],
        Command::Mode(None) => vec![Output::info(format!(
            "Assistant is running in {} mode",
            state.session.mode()
        ))],
        Command::Mode(Some(mode)) => {
            state.session.set_mode(mode);
            state.trace.log_event("mode", mode.label());
            vec![Output::info(format!("Switched to {mode} mode"))]
        }
        Command::Modes => Mode::ALL
            .iter()
            .map(|mode| {
                let marker = if *mode == state.session.mode() { '*' } else { ' ' };
                Output::info(format!("{marker} {:<16} {}", mode.slug(), mode.label()))
            })
            .collect(),
        Command::Upload { paths } => {
            let paths = paths.into_iter().map(PathBuf::from).collect::<Vec<_>>();
            attach_files(state, &paths)
        }
        Command::Files => {
            if state.session.documents().is_empty() {
                return vec![Output::info("No files attached. Use /upload <path>.")];
            }
            state
                .session
                .documents()
                .iter()
                .map(|doc| {
                    Output::info(format!("{} ({} chars)", doc.name, doc.text.chars().count()))
                })
                .collect()
        }
        Command::Analyze => {
            let Some(provider) = &state.llm else {
                return vec![Output::error(MISSING_KEY_MESSAGE)];
            };
            match conversation::analyze(provider, &mut state.session, state.analysis_prefix_chars)
                .await
            {
                Ok(Some(reply)) => {
                    state.trace.log_assistant(&reply);
                    vec![Output::assistant(reply)]
                }
                Ok(None) => vec![Output::info("No files attached. Use /upload <path>.")],
                Err(err) => {
                    let message = format!("Assistant request failed: {err}");
                    state.trace.log_event("error", &message);
                    vec![Output::error(message)]
                }
            }
        }
        Command::History(limit) => {
            let messages = match limit {
                Some(n) => state.session.recent_messages(n),
                None => state.session.messages(),
            };
            if messages.is_empty() {
                return vec![Output::info("History is empty.")];
            }
            messages
                .iter()
                .map(|message| match message.role {
                    ChatRole::User => {
                        Output::new(Tone::Prompt, format!("you: {}", message.content))
                    }
                    ChatRole::Assistant => {
                        Output::assistant(format!("assistant: {}", message.content))
                    }
                })
                .collect()
        }
        Command::New => {
            let mode = state.session.mode();
            state.session = Session::new(mode);
            state
                .trace
                .log_event("session", &format!("new chat {}", state.session.id()));
            vec![Output::info(format!(
                "Started a new chat in {mode} mode. History and files were cleared."
            ))]
        }
        Command::Trace => vec![Output::info(format!(
            "Trace file: {}",
            state.trace.file_path().display()
        ))],
    }
}
