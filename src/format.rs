//! Response formatter. Turns a backend [`ChatResponse`] into display blocks
//! and their lightweight markdown-like text form.
//!
//! Section order is fixed: analysis heading, confidence, alternate
//! categories, legal frameworks, minor-protection advisory, laws, steps,
//! resources, warnings, context, case references, disclaimer.

use crate::payload::{ChatResponse, Law};
use crate::render::{Block, to_text};

pub const MAX_LAWS: usize = 5;
pub const MAX_STEPS: usize = 8;
pub const MAX_RESOURCES: usize = 4;

pub const DISCLAIMER: &str = "Judi is an AI assistant and does not provide binding legal advice.";

const MINOR_PROTECTION_NOTICE: &str = "Because a minor is involved, the Protection of Children from \
Sexual Offences (POCSO) Act, 2012 applies. Reporting is mandatory and the child's identity must be \
kept confidential.";
const MINOR_PROTECTION_HELPLINE: &str = "Call CHILDLINE 1098 (24x7, free) for immediate help.";

/// Text form of [`response_blocks`], stored as the assistant message text.
pub fn format_response(resp: &ChatResponse) -> String {
    to_text(&response_blocks(resp))
}

/// Structured form of a backend response, consumed directly by the renderer.
pub fn response_blocks(resp: &ChatResponse) -> Vec<Block> {
    let mut blocks = Vec::new();

    if resp.is_unknown() {
        blocks.push(Block::heading3("🤔 I couldn't identify a specific legal issue"));
        blocks.push(Block::Paragraph(
            "Could you describe what happened in a little more detail? Mention who was involved, \
             where it happened, and whether it happened online or in person."
                .to_string(),
        ));
        push_warnings(&mut blocks, resp);
        push_footer(&mut blocks);
        return blocks;
    }

    blocks.push(Block::heading3(format!(
        "⚖️ Legal Analysis: {}",
        category_label(&resp.category)
    )));
    blocks.push(Block::Paragraph(format!(
        "**Confidence:** {}",
        percent(resp.confidence)
    )));

    let alternates: Vec<String> = resp
        .matched_categories
        .iter()
        .skip(1)
        .take(2)
        .map(|m| format!("{} ({})", category_label(&m.category), percent(m.confidence)))
        .collect();
    if !alternates.is_empty() {
        blocks.push(Block::Quote(format!("Also relevant: {}", alternates.join(", "))));
    }

    if !resp.legal_frameworks.is_empty() {
        blocks.push(Block::heading4("📜 Applicable Legal Frameworks"));
        blocks.extend(resp.legal_frameworks.iter().map(|f| Block::Bullet(f.clone())));
    }

    if resp
        .context
        .as_ref()
        .is_some_and(|ctx| ctx.requires_minor_protection())
    {
        blocks.push(Block::heading4("🛡️ Special Protection for Minors (POCSO)"));
        blocks.push(Block::Quote(MINOR_PROTECTION_NOTICE.to_string()));
        blocks.push(Block::Quote(MINOR_PROTECTION_HELPLINE.to_string()));
    }

    if !resp.laws.is_empty() {
        blocks.push(Block::heading4("📚 Relevant Laws"));
        blocks.extend(resp.laws.iter().take(MAX_LAWS).map(|law| Block::Bullet(law_line(law))));
        if resp.laws.len() > MAX_LAWS {
            blocks.push(Block::Paragraph(format!("+{} more", resp.laws.len() - MAX_LAWS)));
        }
    }

    if !resp.steps.is_empty() {
        blocks.push(Block::heading4("📋 Recommended Steps"));
        blocks.extend(
            resp.steps
                .iter()
                .take(MAX_STEPS)
                .enumerate()
                .map(|(i, step)| Block::Numbered { number: i + 1, text: step.clone() }),
        );
    }

    if !resp.resources.is_empty() {
        blocks.push(Block::heading4("🔗 Helpful Resources"));
        blocks.extend(
            resp.resources
                .iter()
                .take(MAX_RESOURCES)
                .map(|r| Block::Bullet(r.name().to_string())),
        );
    }

    push_warnings(&mut blocks, resp);

    if let Some(authority) = resp
        .context
        .as_ref()
        .and_then(|ctx| ctx.authority.as_deref())
        .filter(|a| !a.is_empty())
    {
        blocks.push(Block::heading4("🏛️ Context"));
        blocks.push(Block::Paragraph(format!(
            "**Authority involved:** {}",
            category_label(authority)
        )));
    }

    if !resp.case_references.is_empty() {
        blocks.push(Block::heading4("📖 Case References"));
        blocks.extend(resp.case_references.iter().map(|c| Block::Bullet(c.clone())));
    }

    push_footer(&mut blocks);
    blocks
}

fn push_warnings(blocks: &mut Vec<Block>, resp: &ChatResponse) {
    if resp.warnings.is_empty() {
        return;
    }
    blocks.push(Block::heading4("⚠️ Important Warnings"));
    blocks.extend(resp.warnings.iter().map(|w| Block::Quote(w.clone())));
}

fn push_footer(blocks: &mut Vec<Block>) {
    blocks.push(Block::Divider);
    blocks.push(Block::Paragraph(format!("_{DISCLAIMER}_")));
}

fn law_line(law: &Law) -> String {
    fn field(f: &Option<String>) -> Option<&str> {
        f.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    let head = match (field(&law.section), field(&law.act)) {
        (Some(section), Some(act)) => Some(format!("Section {section}, {act}")),
        (Some(section), None) => Some(format!("Section {section}")),
        (None, Some(act)) => Some(act.to_string()),
        (None, None) => None,
    };
    let body = match (field(&law.title), field(&law.description)) {
        (Some(title), Some(desc)) => Some(format!("{title} - {desc}")),
        (Some(title), None) => Some(title.to_string()),
        (None, Some(desc)) => Some(desc.to_string()),
        (None, None) => None,
    };

    match (head, body) {
        (Some(head), Some(body)) => format!("**{head}**: {body}"),
        (Some(head), None) => format!("**{head}**"),
        (None, Some(body)) => body,
        (None, None) => "Unnamed provision".to_string(),
    }
}

/// `sexual_harassment` → `Sexual Harassment`.
pub fn category_label(category: &str) -> String {
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `0.873` → `87%`, clamped to 0–100.
pub fn percent(confidence: f64) -> String {
    let pct = if confidence.is_finite() {
        (confidence * 100.0).round().clamp(0.0, 100.0)
    } else {
        0.0
    };
    format!("{}%", pct as u32)
}
