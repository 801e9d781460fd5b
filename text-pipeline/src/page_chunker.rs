use log::debug;
use study_model::{Chunk, Page};

use crate::token_estimator::estimate_page_tokens;

#[derive(Debug, Clone, Copy)]
pub struct ChunkParams {
    /// Token budget per chunk. A single page whose own estimate exceeds the
    /// budget still becomes its own chunk; pages are never split.
    pub max_tokens: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self { max_tokens: 80_000 }
    }
}

/// Greedily pack pages into chunks under the token budget.
///
/// Chunks partition the input: contiguous, in order, no gaps or overlaps,
/// every chunk non-empty. A new chunk starts as soon as the next page would
/// push the running estimate past the budget.
pub fn chunk_pages(pages: Vec<Page>, params: &ChunkParams) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<Page> = Vec::new();
    let mut current_tokens = 0usize;

    for page in pages {
        let page_tokens = estimate_page_tokens(&page);

        if !current.is_empty() && current_tokens + page_tokens > params.max_tokens {
            chunks.push(Chunk { pages: std::mem::take(&mut current) });
            current_tokens = 0;
        }

        current.push(page);
        current_tokens += page_tokens;
    }

    // Don't forget the last chunk.
    if !current.is_empty() {
        chunks.push(Chunk { pages: current });
    }

    for (i, chunk) in chunks.iter().enumerate() {
        debug!(
            "chunk {}: pages {}-{} ({} pages)",
            i + 1,
            chunk.start_page(),
            chunk.end_page(),
            chunk.pages.len()
        );
    }

    chunks
}
