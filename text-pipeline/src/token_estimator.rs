use study_model::{Page, StructuredPage};

use crate::page_structurer::structure_page;

/// Characters per estimated token. A deliberately cheap heuristic whose only
/// job is to keep chunk sizes roughly bounded; callers must not assume
/// accuracy better than ±30%.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token cost of an already-structured page.
pub fn estimate_structured_tokens(page: &StructuredPage) -> usize {
    let chars: usize = page
        .headers
        .iter()
        .chain(page.bullets.iter())
        .chain(page.body.iter())
        .map(|text| text.chars().count())
        .sum();
    chars / CHARS_PER_TOKEN
}

/// Estimate the token cost of one raw page.
pub fn estimate_page_tokens(page: &Page) -> usize {
    estimate_structured_tokens(&structure_page(page))
}

/// Estimate the combined token cost of a page sequence.
pub fn estimate_tokens(pages: &[Page]) -> usize {
    pages.iter().map(estimate_page_tokens).sum()
}
