//! Conversation data model: consultations, messages and attachments.
//!
//! A [`Consultation`] is one saved thread. Messages are append-only; the
//! title is derived once, from the first message appended.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::payload::ChatResponse;

/// Title shown until the first message is appended.
pub const UNTITLED: &str = "New Consultation";
/// Titles longer than this many characters are cut and suffixed with `...`.
pub const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

/// A user-selected file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub path: PathBuf,
    pub size: u64,
}

impl Attachment {
    /// Reference the file at `path`, inferring its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let meta = fs::metadata(path)
            .map_err(|e| AppError::Attachment(format!("cannot read {}: {e}", path.display())))?;
        if !meta.is_file() {
            return Err(AppError::Attachment(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            mime_type: infer_mime_type(&name),
            name,
            path: path.to_path_buf(),
            size: meta.len(),
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

fn infer_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Milliseconds since epoch, strictly increasing within a consultation.
    pub id: i64,
    pub role: Role,
    #[serde(default)]
    pub text: String,
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
    /// Display time, `HH:MM` local.
    pub time: String,
    /// Raw backend payload; only on assistant replies that succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ChatResponse>,
    /// Id of the user message whose request produced this reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
}

impl Message {
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: 0,
            role: Role::User,
            text: text.into(),
            attachments,
            time: display_time(),
            data: None,
            reply_to: None,
        }
    }

    pub fn assistant(text: impl Into<String>, data: Option<ChatResponse>, reply_to: Option<i64>) -> Self {
        Self {
            id: 0,
            role: Role::Assistant,
            text: text.into(),
            attachments: Vec::new(),
            time: display_time(),
            data,
            reply_to,
        }
    }

    /// Whether a "show details" affordance applies.
    pub fn has_details(&self) -> bool {
        self.data.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl Consultation {
    pub fn new() -> Self {
        Self {
            id: format!("consult_{}", Uuid::new_v4()),
            title: UNTITLED.to_string(),
            messages: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Append `message`, assigning its id. Returns the assigned id.
    ///
    /// The first appended message names the consultation; later ones never
    /// touch the title.
    pub fn push(&mut self, mut message: Message) -> i64 {
        if self.messages.is_empty() {
            if let Some(title) = derive_title(&message) {
                self.title = title;
            }
        }
        message.id = self.next_message_id();
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_assistant_with_details(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.has_details())
    }

    fn next_message_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        match self.messages.last() {
            Some(last) if last.id >= now => last.id + 1,
            _ => now,
        }
    }
}

impl Default for Consultation {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_title(message: &Message) -> Option<String> {
    let text = message.text.trim();
    if !text.is_empty() {
        return Some(truncate_title(text));
    }
    message.attachments.first().map(|a| truncate_title(&a.name))
}

/// Cut `source` to [`TITLE_MAX_CHARS`] characters, appending `...` when cut.
pub fn truncate_title(source: &str) -> String {
    if source.chars().count() <= TITLE_MAX_CHARS {
        return source.to_string();
    }
    source.chars().take(TITLE_MAX_CHARS).collect::<String>() + "..."
}

fn display_time() -> String {
    Local::now().format("%H:%M").to_string()
}
