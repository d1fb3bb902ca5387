//! Compose buffer: the input text and attachments for the next message.

use std::path::Path;

use crate::consultation::Attachment;
use crate::error::AppError;

/// A welcome-screen card that prefills the input.
#[derive(Debug, Clone, Copy)]
pub struct Suggestion {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTIONS: [Suggestion; 3] = [
    Suggestion {
        icon: "📄",
        title: "Review Contract",
        description: "Identify risks in NDAs or lease agreements.",
        prompt: "Review the attached NDA for risks.",
    },
    Suggestion {
        icon: "🏛️",
        title: "Legal Research",
        description: "Query specific case laws or statutes.",
        prompt: "What are the latest precedents on intellectual property rights?",
    },
    Suggestion {
        icon: "✍️",
        title: "Draft Document",
        description: "Generate formal legal notices or letters.",
        prompt: "Draft a formal notice for a tenant dispute.",
    },
];

/// What gets submitted: trimmed text plus attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Default)]
pub struct Composer {
    input: String,
    attachments: Vec<Attachment>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Queue the file at `path` for the next message.
    pub fn attach(&mut self, path: &Path) -> Result<&Attachment, AppError> {
        let attachment = Attachment::from_path(path)?;
        self.attachments.push(attachment);
        Ok(&self.attachments[self.attachments.len() - 1])
    }

    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Drop the pending attachment at `index` (0-based).
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    /// Prefill the input from suggestion `index` (0-based).
    pub fn apply_suggestion(&mut self, index: usize) -> Option<&'static str> {
        let suggestion = SUGGESTIONS.get(index)?;
        self.input = suggestion.prompt.to_string();
        Some(suggestion.prompt)
    }

    /// Sending is allowed with non-blank text or at least one attachment.
    pub fn can_send(&self) -> bool {
        !self.input.trim().is_empty() || !self.attachments.is_empty()
    }

    /// Take the draft and reset the buffer, or `None` when nothing is sendable.
    pub fn take_draft(&mut self) -> Option<Draft> {
        if !self.can_send() {
            return None;
        }
        let text = std::mem::take(&mut self.input).trim().to_string();
        Some(Draft {
            text,
            attachments: std::mem::take(&mut self.attachments),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn attachment(name: &str) -> Attachment {
        Attachment {
            name: name.into(),
            mime_type: "application/pdf".into(),
            path: PathBuf::from(format!("/tmp/{name}")),
            size: 1,
        }
    }

    #[test]
    fn blank_input_cannot_send() {
        let mut c = Composer::new();
        assert!(!c.can_send());
        c.set_input("   \n ");
        assert!(!c.can_send());
        assert!(c.take_draft().is_none());
        assert_eq!(c.input(), "   \n ");
    }

    #[test]
    fn attachment_alone_can_send() {
        let mut c = Composer::new();
        c.push_attachment(attachment("lease.pdf"));
        assert!(c.can_send());
        let draft = c.take_draft().unwrap();
        assert_eq!(draft.text, "");
        assert_eq!(draft.attachments.len(), 1);
        assert!(c.attachments().is_empty());
    }

    #[test]
    fn take_draft_trims_and_clears() {
        let mut c = Composer::new();
        c.set_input("  my employer withheld salary \n");
        c.push_attachment(attachment("payslip.pdf"));
        let draft = c.take_draft().unwrap();
        assert_eq!(draft.text, "my employer withheld salary");
        assert_eq!(c.input(), "");
        assert!(!c.can_send());
    }

    #[test]
    fn remove_attachment_by_index() {
        let mut c = Composer::new();
        c.push_attachment(attachment("a.pdf"));
        c.push_attachment(attachment("b.pdf"));
        assert_eq!(c.remove_attachment(5), None);
        assert_eq!(c.remove_attachment(0).unwrap().name, "a.pdf");
        assert_eq!(c.attachments()[0].name, "b.pdf");
    }

    #[test]
    fn attach_missing_file_leaves_buffer_untouched() {
        let mut c = Composer::new();
        assert!(c.attach(Path::new("/nonexistent/file.pdf")).is_err());
        assert!(c.attachments().is_empty());
    }

    #[test]
    fn suggestions_prefill_input() {
        let mut c = Composer::new();
        assert_eq!(
            c.apply_suggestion(2),
            Some("Draft a formal notice for a tenant dispute.")
        );
        assert_eq!(c.input(), "Draft a formal notice for a tenant dispute.");
        assert_eq!(c.apply_suggestion(3), None);
    }
}
