pub mod page_chunker;
pub mod page_structurer;
pub mod repeat_filter;
pub mod token_estimator;
pub mod topic_segmenter;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use llm_provider::TextCompletion;
use study_model::{Page, Topic};
use thiserror::Error;

pub use page_chunker::{chunk_pages, ChunkParams};
pub use page_structurer::{clean_text, structure_page};
pub use repeat_filter::{detect_repeated, filter_repeated, remove_repeated};
pub use token_estimator::{estimate_page_tokens, estimate_structured_tokens, estimate_tokens};
pub use topic_segmenter::{
    group_by_topics, CarryContext, ChunkSegmentation, SegmentationFailure, SegmenterParams,
    TopicSegmenter,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upstream extraction produced no usable pages. Fatal to the document;
    /// never retried here.
    #[error("document produced no extractable pages")]
    NoPages,
}

/// A page range whose topics came from the heuristic fallback.
#[derive(Debug, Clone)]
pub struct DegradedChunk {
    pub start_page: u32,
    pub end_page: u32,
    pub reason: String,
}

/// Result bundle for one segmented document.
#[derive(Debug, Clone, Default)]
pub struct SegmentationReport {
    pub topics: Vec<Topic>,
    /// Ranges where segmentation fell back to the header heuristic. Topic
    /// names and boundaries are lower quality there.
    pub degraded: Vec<DegradedChunk>,
}

impl SegmentationReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Cooperative cancellation handle checked between chunks.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Document-level entry point: strip boilerplate, chunk, and segment.
///
/// With a client, chunks are segmented by the model with heuristic fallback
/// per failed chunk; without one, the whole document is grouped
/// heuristically and reported as degraded.
pub fn segment_document(
    pages: Vec<Page>,
    client: Option<&dyn TextCompletion>,
    params: &SegmenterParams,
) -> Result<SegmentationReport, PipelineError> {
    segment_document_with_cancel(pages, client, params, &CancelToken::new())
}

/// [`segment_document`] with a cancellation token checked between chunks.
/// Topics from chunks completed before cancellation are kept.
pub fn segment_document_with_cancel(
    pages: Vec<Page>,
    client: Option<&dyn TextCompletion>,
    params: &SegmenterParams,
    cancel: &CancelToken,
) -> Result<SegmentationReport, PipelineError> {
    if pages.is_empty() || pages.iter().all(|p| p.content.is_empty()) {
        return Err(PipelineError::NoPages);
    }

    let pages = filter_repeated(pages);
    let segmenter = TopicSegmenter::new(client, *params);
    Ok(segmenter.segment_with_cancel(pages, cancel))
}
