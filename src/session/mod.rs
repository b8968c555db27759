//! In-memory state for one chat session.
//!
//! A [`Session`] is created explicitly when a chat starts and dropped when the
//! user starts a new one; nothing here is persisted.

mod message;

pub use message::{ChatRole, Message, PromptMessage, PromptRole};

use crate::mode::Mode;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub name: String,
    /// Extracted text, or a placeholder describing why extraction failed.
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    mode: Mode,
    messages: Vec<Message>,
    documents: Vec<ExtractedDocument>,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self::with_id(generate_session_id(), mode)
    }

    pub fn with_id(id: impl Into<String>, mode: Mode) -> Self {
        Self {
            id: id.into(),
            mode,
            messages: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Changes the mode used for subsequent requests. Messages already in the
    /// history are left as they are.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn recent_messages(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Stores text for `name` unless that name is already known. Returns
    /// `false` when the existing entry was kept.
    pub fn record_document(&mut self, name: &str, text: impl Into<String>) -> bool {
        if self.has_document(name) {
            return false;
        }

        self.documents.push(ExtractedDocument {
            name: name.to_string(),
            text: text.into(),
        });
        true
    }

    pub fn has_document(&self, name: &str) -> bool {
        self.document(name).is_some()
    }

    pub fn document(&self, name: &str) -> Option<&ExtractedDocument> {
        self.documents.iter().find(|doc| doc.name == name)
    }

    /// Documents in the order they were first recorded.
    pub fn documents(&self) -> &[ExtractedDocument] {
        &self.documents
    }
}

pub fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
