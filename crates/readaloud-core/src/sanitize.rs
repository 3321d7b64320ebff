//! Narration text sanitizer.
//!
//! Strips markup from the rendered article body so that only prose reaches
//! the synthesis service:
//!
//! - Images `![alt](url)` → removed entirely
//! - Links `[label](url)` → label only
//! - Fenced code blocks (```…```) → removed, including their content
//! - Emphasis/heading/quote characters (`*` `_` `` ` `` `~` `#` `>`) → removed
//! - Bullet list markers (`- `, `* `, `+ `) → item text only
//! - Citation phrases `<label> : <url>` → removed (labels are configurable)
//!
//! Line boundaries are preserved — downstream paragraph segmentation is
//! line-based. Sanitization is idempotent: re-applying it to its own output
//! is a no-op, so the same text can be sanitized independently for the
//! reading-time estimate and for playback without drift.

use serde::{Deserialize, Serialize};

/// Characters removed wherever they appear (emphasis, heading, quote markup).
const MARKUP_CHARS: &[char] = &['*', '_', '`', '~', '#', '>'];

/// Configuration for [`sanitize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeOptions {
    /// Labels recognised in citation phrases of the form `<label> : <url>`.
    ///
    /// The whole phrase (label, colon, URL) is removed. The defaults cover
    /// the Korean label used by the original site plus its English
    /// equivalent; sites in other locales add their own label here.
    pub citation_labels: Vec<String>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            citation_labels: vec!["출처".to_string(), "source".to_string()],
        }
    }
}

/// Strip markup from article text, producing plain prose suitable for TTS.
///
/// Empty input yields empty output; markup-only input yields output with no
/// narratable lines (the segmenter then produces zero paragraphs).
#[must_use]
pub fn sanitize(text: &str, options: &SanitizeOptions) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        // Fenced code blocks are dropped wholesale, fence lines included.
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            continue;
        }

        // Markup characters go before bullet markers: stripping `*` or `>`
        // can expose a leading `- `, and a marker must never survive one
        // pass only to be stripped by the next (idempotence).
        let stripped = strip_images(line);
        let stripped = strip_links(&stripped);
        let stripped = strip_markup_chars(&stripped);
        let stripped = strip_list_markers(&stripped);
        let stripped = strip_citations(&stripped, &options.citation_labels);

        lines.push(stripped.trim().to_string());
    }

    lines.join("\n")
}

// ── Internal helpers ───────────────────────────────────────────────

/// Remove `![alt](url)` image markup entirely.
fn strip_images(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '!' && chars.peek() == Some(&'[') {
            chars.next(); // consume '['
            let alt: String = chars.by_ref().take_while(|&c| c != ']').collect();
            if chars.peek() == Some(&'(') {
                chars.next(); // consume '('
                let _url: String = chars.by_ref().take_while(|&c| c != ')').collect();
                continue;
            }
            // Not a valid image, emit as-is
            result.push('!');
            result.push('[');
            result.push_str(&alt);
            result.push(']');
        } else {
            result.push(c);
        }
    }

    result
}

/// Reduce `[label](url)` link markup to the visible label.
fn strip_links(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '[' {
            let label: String = chars.by_ref().take_while(|&c| c != ']').collect();
            if chars.peek() == Some(&'(') {
                chars.next(); // consume '('
                let _url: String = chars.by_ref().take_while(|&c| c != ')').collect();
                result.push_str(&label);
                continue;
            }
            // Not a valid link, emit as-is
            result.push('[');
            result.push_str(&label);
            result.push(']');
        } else {
            result.push(c);
        }
    }

    result
}

/// Strip leading bullet markers, repeatedly so nested markers collapse in a
/// single pass (required for idempotence).
fn strip_list_markers(line: &str) -> String {
    let mut rest = line.trim_start();

    loop {
        match rest
            .strip_prefix("- ")
            .or_else(|| rest.strip_prefix("* "))
            .or_else(|| rest.strip_prefix("+ "))
        {
            Some(stripped) => rest = stripped.trim_start(),
            None => break,
        }
    }

    rest.to_string()
}

/// Remove every occurrence of the fixed markup character set.
fn strip_markup_chars(text: &str) -> String {
    text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

/// Remove `<label> : <url>` citation phrases for each configured label.
fn strip_citations(text: &str, labels: &[String]) -> String {
    let mut result = text.to_string();
    for label in labels {
        result = strip_citation_label(&result, label);
    }
    result
}

fn strip_citation_label(text: &str, label: &str) -> String {
    if label.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();

    // Rescan from the start after each removal until no phrase remains.
    loop {
        let Some(start) = result.find(label) else {
            break;
        };

        let after_label = &result[start + label.len()..];
        let Some(url_start) = citation_url_offset(after_label) else {
            // A bare label with no URL is prose, not a citation. Later
            // occurrences could still match, but in practice citation lines
            // carry a single label; stop rather than loop forever.
            break;
        };

        let tail = &after_label[url_start..];
        let url_len = tail
            .find(char::is_whitespace)
            .unwrap_or(tail.len());

        let end = start + label.len() + url_start + url_len;
        result.replace_range(start..end, "");
    }

    result
}

/// If `text` starts with `<ws>:<ws>http(s)://`, return the byte offset of the
/// URL within it.
fn citation_url_offset(text: &str) -> Option<usize> {
    let colon_rel = text.trim_start();
    let ws = text.len() - colon_rel.len();
    let rest = colon_rel.strip_prefix(':')?;
    let url_rel = rest.trim_start();
    let inner_ws = rest.len() - url_rel.len();

    if url_rel.starts_with("http://") || url_rel.starts_with("https://") {
        Some(ws + 1 + inner_ws)
    } else {
        None
    }
}
