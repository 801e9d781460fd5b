use std::collections::{HashMap, HashSet};

use log::info;
use study_model::Page;

/// Fraction of pages a line must appear on before it counts as boilerplate.
pub const REPEAT_THRESHOLD: f64 = 0.3;

/// Minimum character length for a boilerplate candidate. Shorter strings
/// (page numbers, stray glyphs) repeat for unrelated reasons.
const MIN_CANDIDATE_CHARS: usize = 5;

/// Find lines that recur across more than [`REPEAT_THRESHOLD`] of the pages.
/// Running headers and footers repeat near-identically through a document
/// and would otherwise pollute every topic's content.
pub fn detect_repeated(pages: &[Page]) -> HashSet<String> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for page in pages {
        for item in &page.content {
            let text = item.text.trim();
            if text.chars().count() > MIN_CANDIDATE_CHARS {
                *frequency.entry(text).or_insert(0) += 1;
            }
        }
    }

    let threshold = pages.len() as f64 * REPEAT_THRESHOLD;
    frequency
        .into_iter()
        .filter(|(_, count)| *count as f64 > threshold)
        .map(|(text, _)| text.to_string())
        .collect()
}

/// Drop every content item whose trimmed text is in `repeated`, preserving
/// the order of the remaining items.
pub fn remove_repeated(pages: &mut [Page], repeated: &HashSet<String>) {
    for page in pages.iter_mut() {
        page.content.retain(|item| !repeated.contains(item.text.trim()));
    }
}

/// Detect and strip boilerplate in one pass.
pub fn filter_repeated(mut pages: Vec<Page>) -> Vec<Page> {
    let repeated = detect_repeated(&pages);
    if !repeated.is_empty() {
        info!("removing {} repeated element(s) across {} pages", repeated.len(), pages.len());
        remove_repeated(&mut pages, &repeated);
    }
    pages
}
