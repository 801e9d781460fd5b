//! Shared models used across crates

use serde::{Deserialize, Serialize};

/// One extracted line of text with its layout metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Raw line text as returned by the extraction backend.
    pub text: String,
    /// Largest font size seen on the line, in points.
    pub font_size: f32,
    /// Whether the line was classified as a header upstream.
    pub is_header: bool,
}

impl ContentItem {
    pub fn new(text: impl Into<String>, font_size: f32, is_header: bool) -> Self {
        Self { text: text.into(), font_size, is_header }
    }

    /// Build an item from a raw extractor span, applying the same header
    /// heuristic the extraction backend uses: large font, or an all-caps
    /// line longer than 3 characters.
    pub fn classified(text: impl Into<String>, font_size: f32) -> Self {
        let text = text.into();
        let is_header = font_size > 14.0 || (text.chars().count() > 3 && is_all_uppercase(&text));
        Self { text, font_size, is_header }
    }
}

fn is_all_uppercase(text: &str) -> bool {
    let mut saw_cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            saw_cased = true;
        }
    }
    saw_cased
}

/// A page as returned by the extraction backend. Page numbers are 1-indexed
/// and unique within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    /// Ordered content lines of the page.
    pub content: Vec<ContentItem>,
    /// Header strings detected by the extractor, in order.
    pub headers: Vec<String>,
    /// Raw full text of the page.
    pub full_text: String,
}

impl Page {
    pub fn new(number: u32, content: Vec<ContentItem>) -> Self {
        let headers = content
            .iter()
            .filter(|item| item.is_header)
            .map(|item| item.text.clone())
            .collect();
        Self { number, content, headers, full_text: String::new() }
    }
}

/// Cleaned, classified view of a single page. Derived; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPage {
    pub number: u32,
    pub headers: Vec<String>,
    pub bullets: Vec<String>,
    pub body: Vec<String>,
}

impl StructuredPage {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.bullets.is_empty() && self.body.is_empty()
    }
}

/// A contiguous run of pages bounded by a token budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub pages: Vec<Page>,
}

impl Chunk {
    pub fn start_page(&self) -> u32 {
        self.pages.first().map(|p| p.number).unwrap_or(0)
    }

    pub fn end_page(&self) -> u32 {
        self.pages.last().map(|p| p.number).unwrap_or(0)
    }
}

/// A contiguous page range identified as covering one coherent subject.
/// Topic names stay in the document's original language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub start_page: u32,
    pub end_page: u32,
    /// Structured content of every page in `[start_page, end_page]`.
    pub content: Vec<StructuredPage>,
}
