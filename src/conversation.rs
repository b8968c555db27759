//! Caller-side conventions around the assistant client: one exchange at a
//! time, per-file document ingest, and batching uploaded documents into a
//! single analysis request.

use crate::assistant::AssistantClient;
use crate::documents::{self, ExtractionError};
use crate::llm::provider::{LlmProvider, LlmResult};
use crate::session::{Message, Session};
use std::fs;
use std::io;
use std::path::Path;

/// Characters of each document included in an analysis request.
pub const DEFAULT_ANALYSIS_PREFIX_CHARS: usize = 3_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, keyed by its file name without directories.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                )
            })?;
        Ok(Self::new(name, fs::read(path)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Extracted { name: String, chars: usize },
    Failed { name: String, placeholder: String },
    AlreadyPresent { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, IngestOutcome::Failed { .. }))
            .count()
    }
}

/// Sends the history plus `prompt` and records both the prompt and the reply.
/// When the provider fails the session is left exactly as it was.
pub async fn ask<P: LlmProvider>(
    provider: &P,
    session: &mut Session,
    prompt: &str,
) -> LlmResult<String> {
    let mut outgoing = session.messages().to_vec();
    outgoing.push(Message::user(prompt));

    let reply = AssistantClient::new(provider, session.mode())
        .chat(&outgoing)
        .await?;

    session.append(Message::user(prompt));
    session.append(Message::assistant(reply.clone()));
    Ok(reply)
}

/// Extracts and records each upload in turn. Names already in the session
/// are skipped without re-reading, and a failing file only produces a
/// placeholder for itself.
pub fn ingest(session: &mut Session, uploads: impl IntoIterator<Item = Upload>) -> IngestReport {
    let mut report = IngestReport::default();

    for upload in uploads {
        if session.has_document(&upload.name) {
            report.outcomes.push(IngestOutcome::AlreadyPresent { name: upload.name });
            continue;
        }

        let outcome = match documents::extract_text(&upload.name, &upload.bytes) {
            Ok(text) => {
                let chars = text.chars().count();
                session.record_document(&upload.name, text);
                IngestOutcome::Extracted {
                    name: upload.name,
                    chars,
                }
            }
            Err(err) => failed(session, upload.name, &err),
        };
        report.outcomes.push(outcome);
    }

    report
}

fn failed(session: &mut Session, name: String, err: &ExtractionError) -> IngestOutcome {
    let placeholder = documents::failure_placeholder(&name, err);
    session.record_document(&name, placeholder.clone());
    IngestOutcome::Failed { name, placeholder }
}

pub fn ready_summary(session: &Session) -> String {
    format!("{} file(s) ready for analysis.", session.documents().len())
}

/// Builds the synthetic user message carrying every document, each cut to
/// `prefix_chars` characters. Returns `None` when nothing was uploaded.
///
/// Anything past the prefix is not sent; long files are only partially seen
/// by the model.
pub fn analysis_message(session: &Session, prefix_chars: usize) -> Option<Message> {
    if session.documents().is_empty() {
        return None;
    }

    let body = session
        .documents()
        .iter()
        .map(|doc| format!("📄 {}:\n{}", doc.name, char_prefix(&doc.text, prefix_chars)))
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(Message::user(body))
}

/// Asks the model to analyze all uploaded documents. The batched document
/// message is only sent, never stored; the reply is appended to the history.
pub async fn analyze<P: LlmProvider>(
    provider: &P,
    session: &mut Session,
    prefix_chars: usize,
) -> LlmResult<Option<String>> {
    let Some(batch) = analysis_message(session, prefix_chars) else {
        return Ok(None);
    };

    let mut outgoing = session.messages().to_vec();
    outgoing.push(batch);

    let reply = AssistantClient::new(provider, session.mode())
        .chat(&outgoing)
        .await?;
    session.append(Message::assistant(reply.clone()));
    Ok(Some(reply))
}

fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
