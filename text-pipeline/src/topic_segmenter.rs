use llm_provider::{CompletionError, TextCompletion};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use study_model::{Chunk, Page, Topic};
use thiserror::Error;

use crate::page_chunker::{chunk_pages, ChunkParams};
use crate::page_structurer::structure_page;
use crate::{CancelToken, DegradedChunk, SegmentationReport};

/// Completion budget for a topic-identification call.
const TOPIC_MAX_TOKENS: u32 = 2000;
/// Completion budget for a carry-context summary call.
const SUMMARY_MAX_TOKENS: u32 = 150;

#[derive(Debug, Clone, Copy)]
pub struct SegmenterParams {
    /// Token budget per chunk submitted to the model.
    pub max_chunk_tokens: usize,
    /// Page cap per topic in the heuristic fallback grouping.
    pub max_pages_per_topic: usize,
    /// How many trailing topics feed the next chunk's context block.
    pub context_topics: usize,
    /// How many trailing pages feed the context summary call.
    pub summary_tail_pages: usize,
    /// Bullets shown per page in the prompt summary.
    pub summary_bullets: usize,
    /// Body items shown per page in the prompt summary.
    pub summary_body_items: usize,
    /// Character cap on the joined body excerpt per page.
    pub summary_body_chars: usize,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 80_000,
            max_pages_per_topic: 3,
            context_topics: 2,
            summary_tail_pages: 3,
            summary_bullets: 5,
            summary_body_items: 3,
            summary_body_chars: 200,
        }
    }
}

/// Why a chunk fell back to the heuristic grouping.
#[derive(Debug, Error)]
pub enum SegmentationFailure {
    #[error("completion request failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("topic response was not valid JSON: {0}")]
    MalformedResponse(String),
}

/// Tagged per-chunk result so callers can observe degraded quality without
/// inspecting logs.
#[derive(Debug, Clone)]
pub enum ChunkSegmentation {
    /// Topics came from the model.
    Segmented(Vec<Topic>),
    /// The model call failed for this chunk; topics came from the header
    /// heuristic instead.
    Degraded { topics: Vec<Topic>, reason: String },
}

/// Context carried from one chunk to the next so a topic spanning a chunk
/// boundary is continued instead of split. An explicit accumulator value:
/// passed into each chunk call and returned updated, never ambient state.
#[derive(Debug, Clone, Default)]
pub struct CarryContext {
    /// Rendered lines for the last identified topics, e.g. "- Pages 4-6: …".
    topic_lines: Vec<String>,
    /// Short prose summary of the previous chunk's tail, when available.
    summary: Option<String>,
    /// Last page of the previous chunk.
    end_page: Option<u32>,
}

impl CarryContext {
    pub fn is_empty(&self) -> bool {
        self.topic_lines.is_empty()
    }

    fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let topic_list = self.topic_lines.join("\n");
        match (&self.summary, self.end_page) {
            (Some(summary), Some(end_page)) => Some(format!(
                "Topics identified in previous chunk:\n{topic_list}\n\n\
                 Content summary (ending at page {end_page}):\n{summary}"
            )),
            _ => Some(format!("Topics identified in previous chunk:\n{topic_list}")),
        }
    }
}

#[derive(Serialize)]
struct PageSummary {
    page: u32,
    content: String,
}

#[derive(Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    topics: Vec<TopicSpan>,
}

#[derive(Debug, Deserialize)]
struct TopicSpan {
    topic_name: String,
    start_page: u32,
    end_page: u32,
    #[serde(default)]
    reasoning: String,
}

/// Sequential, chunk-at-a-time topic segmentation over a document.
pub struct TopicSegmenter<'a> {
    client: Option<&'a dyn TextCompletion>,
    params: SegmenterParams,
}

impl<'a> TopicSegmenter<'a> {
    pub fn new(client: Option<&'a dyn TextCompletion>, params: SegmenterParams) -> Self {
        Self { client, params }
    }

    /// Segment a whole document. See [`segment_with_cancel`].
    ///
    /// [`segment_with_cancel`]: TopicSegmenter::segment_with_cancel
    pub fn segment(&self, pages: Vec<Page>) -> SegmentationReport {
        self.segment_with_cancel(pages, &CancelToken::new())
    }

    /// Segment a whole document, checking `cancel` between chunks. Chunks
    /// processed before cancellation keep their topics; processing is
    /// incremental and a partial result is resumable, not rolled back.
    pub fn segment_with_cancel(&self, pages: Vec<Page>, cancel: &CancelToken) -> SegmentationReport {
        let Some(client) = self.client else {
            // No collaborator at all: heuristic grouping for the document,
            // reported as one degraded range so callers can see it.
            let start_page = pages.first().map(|p| p.number).unwrap_or(0);
            let end_page = pages.last().map(|p| p.number).unwrap_or(0);
            let topics = group_by_topics(&pages, self.params.max_pages_per_topic);
            return SegmentationReport {
                topics,
                degraded: vec![DegradedChunk {
                    start_page,
                    end_page,
                    reason: "no completion client configured".into(),
                }],
            };
        };

        let chunks = chunk_pages(pages, &ChunkParams { max_tokens: self.params.max_chunk_tokens });
        info!(
            "created {} dynamic chunk(s) (max {} tokens each)",
            chunks.len(),
            self.params.max_chunk_tokens
        );

        let mut report = SegmentationReport { topics: Vec::new(), degraded: Vec::new() };
        let mut context = CarryContext::default();

        for (index, chunk) in chunks.iter().enumerate() {
            if cancel.is_canceled() {
                warn!("segmentation canceled after {index} of {} chunk(s)", chunks.len());
                break;
            }

            info!(
                "processing chunk {}/{}: pages {}-{}",
                index + 1,
                chunks.len(),
                chunk.start_page(),
                chunk.end_page()
            );

            let (result, next_context) = self.segment_chunk(client, chunk, &context);
            match result {
                ChunkSegmentation::Segmented(topics) => report.topics.extend(topics),
                ChunkSegmentation::Degraded { topics, reason } => {
                    report.degraded.push(DegradedChunk {
                        start_page: chunk.start_page(),
                        end_page: chunk.end_page(),
                        reason,
                    });
                    report.topics.extend(topics);
                }
            }
            context = next_context;
        }

        report
    }

    /// Process one chunk against the carry context, returning the tagged
    /// result and the context for the next chunk. A failure here degrades
    /// this chunk only; it never aborts the document.
    pub fn segment_chunk(
        &self,
        client: &dyn TextCompletion,
        chunk: &Chunk,
        context: &CarryContext,
    ) -> (ChunkSegmentation, CarryContext) {
        let summaries = self.page_summaries(chunk);

        match self.request_topics(client, &summaries, context) {
            Ok(spans) => {
                let topics = materialize_topics(chunk, &spans);
                let next_context = if topics.is_empty() {
                    // Nothing identified; keep the previous context alive.
                    context.clone()
                } else {
                    self.regenerate_context(client, chunk, &summaries, &topics)
                };
                (ChunkSegmentation::Segmented(topics), next_context)
            }
            Err(failure) => {
                error!(
                    "topic identification failed for pages {}-{}: {failure}",
                    chunk.start_page(),
                    chunk.end_page()
                );
                let topics = group_by_topics(&chunk.pages, self.params.max_pages_per_topic);
                let next_context = fallback_context(&topics);
                (ChunkSegmentation::Degraded { topics, reason: failure.to_string() }, next_context)
            }
        }
    }

    /// Compact per-page digest kept small enough for the prompt budget.
    fn page_summaries(&self, chunk: &Chunk) -> Vec<PageSummary> {
        chunk
            .pages
            .iter()
            .map(|page| {
                let structured = structure_page(page);
                let mut lines = Vec::new();
                if !structured.headers.is_empty() {
                    lines.push(format!("HEADERS: {}", structured.headers.join(" | ")));
                }
                if !structured.bullets.is_empty() {
                    let shown: Vec<&str> = structured
                        .bullets
                        .iter()
                        .take(self.params.summary_bullets)
                        .map(String::as_str)
                        .collect();
                    lines.push(format!("BULLETS: {}", shown.join("; ")));
                }
                if !structured.body.is_empty() {
                    let joined: String = structured
                        .body
                        .iter()
                        .take(self.params.summary_body_items)
                        .map(String::as_str)
                        .collect::<Vec<&str>>()
                        .join(" ");
                    lines.push(format!(
                        "CONTENT: {}",
                        truncate_chars(&joined, self.params.summary_body_chars)
                    ));
                }
                PageSummary { page: page.number, content: lines.join("\n") }
            })
            .collect()
    }

    fn request_topics(
        &self,
        client: &dyn TextCompletion,
        summaries: &[PageSummary],
        context: &CarryContext,
    ) -> Result<Vec<TopicSpan>, SegmentationFailure> {
        let prompt = build_topic_prompt(summaries, context);
        let response = client.complete(&prompt, TOPIC_MAX_TOKENS)?;
        parse_topic_response(&response)
    }

    /// Rebuild the carry context from this chunk's topics plus a short
    /// model-written summary of the chunk's tail. If the summary call
    /// fails, the topic lines alone are carried forward; the chunk itself
    /// is not degraded.
    fn regenerate_context(
        &self,
        client: &dyn TextCompletion,
        chunk: &Chunk,
        summaries: &[PageSummary],
        topics: &[Topic],
    ) -> CarryContext {
        let take = self.params.context_topics.min(topics.len());
        let topic_lines: Vec<String> = topics[topics.len() - take..]
            .iter()
            .map(|t| format!("- Pages {}-{}: {}", t.start_page, t.end_page, t.name))
            .collect();

        let tail = self.params.summary_tail_pages.min(summaries.len());
        let tail_summaries = &summaries[summaries.len() - tail..];
        let prompt = format!(
            "Briefly summarize what these pages discuss (1-2 sentences max). \
             Keep the summary in the ORIGINAL LANGUAGE.\n\nPages:\n{}\n\nSummary:",
            summaries_json(tail_summaries)
        );

        let summary = match client.complete(&prompt, SUMMARY_MAX_TOKENS) {
            Ok(text) => Some(text.trim().to_string()),
            Err(err) => {
                warn!("context summary unavailable, carrying topic names only: {err}");
                None
            }
        };

        CarryContext { topic_lines, summary, end_page: Some(chunk.end_page()) }
    }
}

/// Header-driven grouping used when no model is available or a chunk's
/// model call failed. A new topic opens on any page with a header, when the
/// open topic reaches `max_pages_per_topic` pages, or when no topic is open
/// yet; headerless openers get a synthetic name.
pub fn group_by_topics(pages: &[Page], max_pages_per_topic: usize) -> Vec<Topic> {
    let mut topics: Vec<Topic> = Vec::new();
    let mut current: Option<Topic> = None;
    let mut pages_in_current = 0usize;

    for page in pages {
        let structured = structure_page(page);
        let has_header = !structured.headers.is_empty();

        let should_start_new = has_header
            || (current.is_some() && pages_in_current >= max_pages_per_topic)
            || current.is_none();

        if should_start_new {
            if let Some(topic) = current.take() {
                topics.push(topic);
                pages_in_current = 0;
            }
        }

        if has_header {
            current = Some(Topic {
                name: structured.headers[0].clone(),
                start_page: page.number,
                end_page: page.number,
                content: vec![structured],
            });
            pages_in_current = 1;
        } else if let Some(topic) = current.as_mut() {
            topic.end_page = page.number;
            topic.content.push(structured);
            pages_in_current += 1;
        } else {
            current = Some(Topic {
                name: format!("Section starting at page {}", page.number),
                start_page: page.number,
                end_page: page.number,
                content: vec![structured],
            });
            pages_in_current = 1;
        }
    }

    if let Some(topic) = current {
        topics.push(topic);
    }

    topics
}

fn materialize_topics(chunk: &Chunk, spans: &[TopicSpan]) -> Vec<Topic> {
    let mut topics = Vec::new();
    for span in spans {
        let content: Vec<_> = chunk
            .pages
            .iter()
            .filter(|p| span.start_page <= p.number && p.number <= span.end_page)
            .map(structure_page)
            .collect();

        // Spans matching none of this chunk's pages are dropped.
        if content.is_empty() {
            continue;
        }

        debug!(
            "topic \"{}\" (pages {}-{}): {}",
            span.topic_name, span.start_page, span.end_page, span.reasoning
        );
        topics.push(Topic {
            name: span.topic_name.clone(),
            start_page: span.start_page,
            end_page: span.end_page,
            content,
        });
    }
    topics
}

fn fallback_context(topics: &[Topic]) -> CarryContext {
    match topics.last() {
        Some(last) => CarryContext {
            topic_lines: vec![format!("- Pages {}-{}: {}", last.start_page, last.end_page, last.name)],
            summary: None,
            end_page: Some(last.end_page),
        },
        None => CarryContext::default(),
    }
}

fn build_topic_prompt(summaries: &[PageSummary], context: &CarryContext) -> String {
    let context_section = match context.render() {
        Some(rendered) => format!(
            "\nCONTEXT FROM PREVIOUS PAGES:\n{rendered}\n\n\
             NOTE: If the first page(s) in the current batch continue the last topic from the \
             context, include them in a topic that starts from that earlier page number.\n"
        ),
        None => String::new(),
    };

    format!(
        "Analyze these study document pages and identify distinct topics. \
         Group consecutive pages that discuss the same subject.\n\n\
         IMPORTANT: Keep all topic names in the ORIGINAL LANGUAGE of the document.\n\
         {context_section}\n\
         CURRENT PAGES TO ANALYZE:\n{}\n\n\
         Return ONLY valid JSON in this format:\n\
         {{\n  \"topics\": [\n    {{\n      \"topic_name\": \"Topic name in original language\",\n      \
         \"start_page\": 1,\n      \"end_page\": 3,\n      \"reasoning\": \"Brief explanation\"\n    }}\n  ]\n}}",
        summaries_json(summaries)
    )
}

fn summaries_json(summaries: &[PageSummary]) -> String {
    // PageSummary is a flat struct of primitives; serialization cannot fail.
    serde_json::to_string_pretty(summaries).expect("page summaries serialize")
}

fn parse_topic_response(response: &str) -> Result<Vec<TopicSpan>, SegmentationFailure> {
    let payload = strip_code_fence(response);
    let parsed: TopicsResponse = serde_json::from_str(payload.trim())
        .map_err(|err| SegmentationFailure::MalformedResponse(err.to_string()))?;
    Ok(parsed.topics)
}

/// Tolerate a fenced ```json wrapper around the JSON payload.
fn strip_code_fence(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            return &rest[..end];
        }
        return rest;
    }
    text
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
