use llm_provider::{AnthropicClient, AnthropicConfig, CompletionError, TextCompletion};
use log::info;
use review_scheduler::{update_review_now, ReviewRecord, SchedulerError};
use study_model::Page;
use text_pipeline::{
    segment_document_with_cancel, CancelToken, PipelineError, SegmentationReport, SegmenterParams,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Upstream extraction delivered no usable pages. Fatal to the document.
    #[error("document has no extractable pages")]
    ExtractionUnavailable,
    #[error("completion client error: {0}")]
    Completion(#[from] CompletionError),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub segmenter: SegmenterParams,
    /// When absent, segmentation runs heuristic-only and every document is
    /// reported as degraded.
    pub completion: Option<AnthropicConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { segmenter: SegmenterParams::default(), completion: None }
    }
}

/// Composition layer over the pipeline crates: one service instance per
/// deployment, one `process_document` call per uploaded document. Callers
/// are expected to run each call on a dedicated worker; a slow completion
/// request blocks the calling thread only.
pub struct StudyService {
    segmenter: SegmenterParams,
    client: Option<AnthropicClient>,
}

impl StudyService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = match config.completion {
            Some(completion) => Some(AnthropicClient::new(completion)?),
            None => None,
        };
        Ok(Self { segmenter: config.segmenter, client })
    }

    /// Whether a completion client is configured.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Run the full pipeline for one document: boilerplate filtering,
    /// chunking, and topic segmentation.
    pub fn process_document(&self, pages: Vec<Page>) -> Result<SegmentationReport, ServiceError> {
        self.process_document_with_cancel(pages, &CancelToken::new())
    }

    /// [`process_document`](StudyService::process_document) with cooperative
    /// cancellation. Topics from chunks completed before cancellation are
    /// kept; a partially processed document is resumable, not rolled back.
    pub fn process_document_with_cancel(
        &self,
        pages: Vec<Page>,
        cancel: &CancelToken,
    ) -> Result<SegmentationReport, ServiceError> {
        info!("processing document with {} page(s)", pages.len());
        let client = self.client.as_ref().map(|c| c as &dyn TextCompletion);
        let report = segment_document_with_cancel(pages, client, &self.segmenter, cancel)
            .map_err(|err| match err {
                PipelineError::NoPages => ServiceError::ExtractionUnavailable,
            })?;

        if report.is_degraded() {
            info!(
                "segmentation degraded for {} chunk(s); topic quality is reduced there",
                report.degraded.len()
            );
        }
        Ok(report)
    }

    /// Apply one recorded answer to a question's spaced-repetition record.
    /// The caller owns persistence; updates for the same question must be
    /// serialized (transaction or version check) to avoid lost updates.
    pub fn record_review(
        &self,
        record: &ReviewRecord,
        quality: u8,
    ) -> Result<ReviewRecord, ServiceError> {
        Ok(update_review_now(record, quality)?)
    }
}
