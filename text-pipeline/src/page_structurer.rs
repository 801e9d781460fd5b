use std::sync::OnceLock;

use regex::Regex;
use study_model::{Page, StructuredPage};

/// Glyphs that mark a cleaned line as a bullet item.
const BULLET_GLYPHS: [char; 4] = ['•', '-', '*', '○'];

fn artifact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Flowchart extraction artifact: single characters interleaved with
    // dash-bullet-dash separators, e.g. "-•-D-•-o-•-m-•-a-•-n-•-i-•-".
    RE.get_or_init(|| Regex::new(r"(-•-[A-Za-z0-9\s]){3,}").expect("valid artifact pattern"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn trailing_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\s*$").expect("valid page-footer pattern"))
}

/// Normalize one extracted line.
///
/// The dash-bullet interleaving is only stripped when the full repeated
/// pattern is present, so legitimate dashes and bullets survive. Whitespace
/// runs collapse to a single space and trailing page-number artifacts are
/// dropped.
pub fn clean_text(text: &str) -> String {
    let text = if artifact_re().is_match(text) {
        text.replace("-•-", "")
    } else {
        text.to_string()
    };

    let text = whitespace_re().replace_all(&text, " ");
    let text = trailing_number_re().replace(&text, "");

    text.trim().to_string()
}

/// Classify a page's cleaned content lines into headers, bullets, and body.
/// Pure transform; empty lines after cleaning are dropped.
pub fn structure_page(page: &Page) -> StructuredPage {
    let mut structured = StructuredPage {
        number: page.number,
        headers: Vec::new(),
        bullets: Vec::new(),
        body: Vec::new(),
    };

    for item in &page.content {
        let text = clean_text(&item.text);
        if text.is_empty() {
            continue;
        }

        if item.is_header {
            structured.headers.push(text);
        } else if text.starts_with(BULLET_GLYPHS) {
            let stripped = text.trim_start_matches(['•', '-', '*', '○', ' ']);
            structured.bullets.push(stripped.to_string());
        } else {
            structured.body.push(text);
        }
    }

    structured
}
