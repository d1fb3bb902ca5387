//! Display blocks and terminal rendering.
//!
//! Assistant replies that carry a backend payload are rendered from the
//! payload itself via [`format::response_blocks`]. Everything else (user
//! text, error replies, messages restored without a payload) goes through
//! [`parse_text`], which sniffs each line's leading token:
//!
//! ```text
//! ### heading        #### subheading     > quote
//! * bullet           12. numbered        ---  divider
//! ```

use colored::{ColoredString, Colorize};

use crate::compose::SUGGESTIONS;
use crate::consultation::{Message, Role};
use crate::format::{self, DISCLAIMER};
use crate::store::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `level` is 3 (`### `) or 4 (`#### `).
    Heading { level: u8, text: String },
    Quote(String),
    Bullet(String),
    Numbered { number: usize, text: String },
    Divider,
    Paragraph(String),
}

impl Block {
    pub fn heading3(text: impl Into<String>) -> Self {
        Self::Heading { level: 3, text: text.into() }
    }

    pub fn heading4(text: impl Into<String>) -> Self {
        Self::Heading { level: 4, text: text.into() }
    }

    /// Single-line text form.
    pub fn to_line(&self) -> String {
        match self {
            Self::Heading { level, text } => {
                format!("{} {text}", "#".repeat(usize::from(*level)))
            }
            Self::Quote(text) => format!("> {text}"),
            Self::Bullet(text) => format!("* {text}"),
            Self::Numbered { number, text } => format!("{number}. {text}"),
            Self::Divider => "---".to_string(),
            Self::Paragraph(text) => text.clone(),
        }
    }
}

/// Join blocks into text, with a blank line before every heading and divider
/// after the first block.
pub fn to_text(blocks: &[Block]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            if matches!(block, Block::Heading { .. } | Block::Divider) {
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&block.to_line());
    }
    out
}

/// Recover blocks from text by leading-token sniffing. Blank lines are
/// dropped; unrecognised lines become paragraphs.
pub fn parse_text(text: &str) -> Vec<Block> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("#### ") {
        return Block::heading4(rest);
    }
    if let Some(rest) = line.strip_prefix("### ") {
        return Block::heading3(rest);
    }
    if let Some(rest) = line.strip_prefix("> ") {
        return Block::Quote(rest.to_string());
    }
    if let Some(rest) = line.strip_prefix("* ") {
        return Block::Bullet(rest.to_string());
    }
    if line.trim() == "---" {
        return Block::Divider;
    }
    if let Some((number, rest)) = split_numbered(line) {
        return Block::Numbered { number, text: rest.to_string() };
    }
    Block::Paragraph(line.to_string())
}

/// `"12. text"` → `(12, "text")`.
fn split_numbered(line: &str) -> Option<(usize, &str)> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    let number = line[..digits].parse().ok()?;
    Some((number, rest))
}

/// Blocks for a message body: payload-driven when a payload exists,
/// text-driven otherwise.
pub fn message_blocks(message: &Message) -> Vec<Block> {
    match &message.data {
        Some(payload) => format::response_blocks(payload),
        None => parse_text(&message.text),
    }
}

// ── Terminal painting ─────────────────────────────────────────────────────────

struct Palette {
    title: fn(ColoredString) -> ColoredString,
    section: fn(ColoredString) -> ColoredString,
    accent: fn(ColoredString) -> ColoredString,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            title: |s| s.blue().bold(),
            section: |s| s.magenta().bold(),
            accent: |s| s.green(),
        },
        Theme::Dark => Palette {
            title: |s| s.bright_cyan().bold(),
            section: |s| s.bright_yellow().bold(),
            accent: |s| s.bright_green(),
        },
    }
}

/// Paint blocks for the terminal.
pub fn paint(blocks: &[Block], theme: Theme) -> String {
    let p = palette(theme);
    let mut lines = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 && matches!(block, Block::Heading { .. }) {
            lines.push(String::new());
        }
        let line = match block {
            Block::Heading { level: 3, text } => (p.title)(text.as_str().into()).to_string(),
            Block::Heading { text, .. } => (p.section)(text.as_str().into()).to_string(),
            Block::Quote(text) => format!("{} {}", (p.accent)("│".into()), inline(text).italic()),
            Block::Bullet(text) => format!("  {} {}", (p.accent)("•".into()), inline(text)),
            Block::Numbered { number, text } => {
                format!("  {} {}", (p.accent)(format!("{number}.").into()), inline(text))
            }
            Block::Divider => "─".repeat(40).dimmed().to_string(),
            Block::Paragraph(text) => inline(text),
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// Render `**bold**` and `_italic_` spans. Unbalanced markers are kept as is.
fn inline(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&after[..end].bold().to_string());
        rest = &after[end + 2..];
    }
    if rest.len() > 2 && rest.starts_with('_') && rest.ends_with('_') {
        out.push_str(&rest[1..rest.len() - 1].italic().to_string());
    } else {
        out.push_str(rest);
    }
    out
}

/// Full terminal view of one message: attachments, body, info line.
pub fn message_view(message: &Message, theme: Theme, assistant_name: &str) -> String {
    let mut lines = Vec::new();

    for att in &message.attachments {
        let marker = if att.is_image() { "🖼️" } else { "📄" };
        lines.push(format!("{marker} {}", att.name).dimmed().to_string());
    }

    let blocks = message_blocks(message);
    if !blocks.is_empty() {
        lines.push(paint(&blocks, theme));
    }

    let who = match message.role {
        Role::Assistant => assistant_name,
        Role::User => "You",
    };
    let mut info = format!("{who} • {}", message.time);
    if message.has_details() {
        info.push_str("  (/details)");
    }
    lines.push(info.dimmed().to_string());

    lines.join("\n")
}

/// Shown while the active consultation has no messages.
pub fn welcome_view(theme: Theme) -> String {
    let mut blocks = vec![
        Block::heading3("⚖️ How can I assist your legal research today?"),
        Block::Paragraph(
            "Upload documents or ask complex legal questions to get started.".to_string(),
        ),
    ];
    blocks.extend(SUGGESTIONS.iter().enumerate().map(|(i, s)| Block::Numbered {
        number: i + 1,
        text: format!("{} {} - {} (/suggest {})", s.icon, s.title, s.description, i + 1),
    }));
    blocks.push(Block::Divider);
    blocks.push(Block::Paragraph(format!("_{DISCLAIMER}_")));
    paint(&blocks, theme)
}
