use anyhow::{anyhow, Result};
use mail_parser::decoders::html::html_to_text;
use mail_parser::{Address, MessageParser, MimeHeaders, PartType};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn svg_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)</?svg\b[^>]*>").unwrap())
}

/// Everything the risk engine needs from a message, extracted once per run
/// and read-only afterward.
#[derive(Debug, Clone, Default)]
pub struct EmailParts {
    pub headers: HashMap<String, String>,
    /// Concatenation of all non-attachment text/plain parts and the visible
    /// text of text/html parts, in message order.
    pub plain_text: String,
    /// Inline `<svg>` markup from HTML bodies plus decoded image/svg+xml
    /// payloads, in message order.
    pub svg_fragments: Vec<String>,
}

impl EmailParts {
    /// Decompose a raw RFC 5322 message. An unparseable message structure is
    /// the one fatal error in the pipeline.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| anyhow!("raw input could not be parsed as a MIME message"))?;

        let mut parts = EmailParts::default();

        if let Some(subject) = message.subject() {
            parts
                .headers
                .insert("Subject".to_string(), subject.to_string());
        }
        if let Some(from) = format_address(message.from()) {
            parts.headers.insert("From".to_string(), from);
        }
        if let Some(to) = format_address(message.to()) {
            parts.headers.insert("To".to_string(), to);
        }

        for part in &message.parts {
            // SVG payloads are collected whatever their disposition.
            if is_svg_content_type(part) {
                let name = part.attachment_name().unwrap_or("unnamed");
                log::debug!("found SVG part: {name}");
                parts
                    .svg_fragments
                    .push(String::from_utf8_lossy(part.contents()).into_owned());
                continue;
            }

            if is_attachment(part) {
                continue;
            }

            match &part.body {
                PartType::Text(text) => parts.plain_text.push_str(text),
                PartType::Html(html) => {
                    parts.svg_fragments.extend(extract_svg_fragments(html));
                    parts.plain_text.push_str(&html_to_text(html));
                }
                _ => {}
            }
        }

        log::debug!(
            "extracted {} chars of text and {} SVG fragment(s)",
            parts.plain_text.len(),
            parts.svg_fragments.len()
        );
        Ok(parts)
    }

    /// Header value by name; a missing header reads as empty, not as an error.
    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name).map(String::as_str).unwrap_or("")
    }
}

fn format_address(address: Option<&Address>) -> Option<String> {
    let addr = address?.first()?;
    let email = addr.address.as_deref().unwrap_or("");
    Some(match addr.name.as_deref() {
        Some(name) if !name.is_empty() => format!("{name} <{email}>"),
        _ => email.to_string(),
    })
}

fn is_attachment(part: &mail_parser::MessagePart) -> bool {
    part.content_disposition()
        .map(|cd| cd.ctype().eq_ignore_ascii_case("attachment"))
        .unwrap_or(false)
}

fn is_svg_content_type(part: &mail_parser::MessagePart) -> bool {
    part.content_type()
        .map(|ct| {
            ct.ctype().eq_ignore_ascii_case("image")
                && ct
                    .subtype()
                    .is_some_and(|sub| sub.eq_ignore_ascii_case("svg+xml"))
        })
        .unwrap_or(false)
}

/// Pull complete `<svg>...</svg>` elements out of an HTML body. Tracks tag
/// depth so nested `<svg>` elements stay inside one fragment.
fn extract_svg_fragments(html: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for tag in svg_tag_pattern().find_iter(html) {
        if tag.as_str().starts_with("</") {
            if depth > 0 {
                depth -= 1;
                if depth == 0 {
                    if let Some(open) = start.take() {
                        fragments.push(html[open..tag.end()].to_string());
                    }
                }
            }
        } else if tag.as_str().ends_with("/>") {
            if depth == 0 {
                fragments.push(tag.as_str().to_string());
            }
        } else {
            if depth == 0 {
                start = Some(tag.start());
            }
            depth += 1;
        }
    }

    fragments
}
