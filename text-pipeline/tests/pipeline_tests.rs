use study_model::{ContentItem, Page};
use text_pipeline::{
    chunk_pages, clean_text, detect_repeated, estimate_page_tokens, estimate_tokens,
    filter_repeated, group_by_topics, segment_document, structure_page, ChunkParams, PipelineError,
    SegmenterParams,
};

fn body_page(number: u32, text: &str) -> Page {
    Page::new(number, vec![ContentItem::new(text, 11.0, false)])
}

/// Page whose body estimates to exactly `tokens` (4 chars per token).
fn page_with_tokens(number: u32, tokens: usize) -> Page {
    body_page(number, &"a".repeat(tokens * 4))
}

#[test]
fn clean_text_strips_flowchart_artifact_only_when_pattern_repeats() {
    assert_eq!(clean_text("-•-D-•-o-•-m-•-a-•-n-•-i-•-"), "Domani");
    // A lone separator is legitimate text and survives.
    assert_eq!(clean_text("risk -•- benefit"), "risk -•- benefit");
}

#[test]
fn clean_text_collapses_whitespace_runs() {
    assert_eq!(clean_text("dispensing   rules\n\napply here"), "dispensing rules apply here");
}

#[test]
fn clean_text_strips_trailing_page_numbers() {
    assert_eq!(clean_text("Registro de recetas 42"), "Registro de recetas");
    // A line that is only a page number cleans away entirely.
    assert_eq!(clean_text("17"), "");
}

#[test]
fn structure_page_classifies_headers_bullets_and_body() {
    let page = Page::new(
        2,
        vec![
            ContentItem::new("DISPENSING REQUIREMENTS", 16.0, true),
            ContentItem::new("• valid prescription on file", 11.0, false),
            ContentItem::new("- pharmacist countersignature", 11.0, false),
            ContentItem::new("These rules apply to all schedule II drugs.", 11.0, false),
            ContentItem::new("   ", 11.0, false),
        ],
    );

    let structured = structure_page(&page);
    assert_eq!(structured.number, 2);
    assert_eq!(structured.headers, vec!["DISPENSING REQUIREMENTS"]);
    assert_eq!(
        structured.bullets,
        vec!["valid prescription on file", "pharmacist countersignature"]
    );
    assert_eq!(structured.body, vec!["These rules apply to all schedule II drugs."]);
}

#[test]
fn repeated_elements_above_threshold_are_detected_and_removed() {
    let footer = "Pharmacy Law Handbook - 2nd Edition";
    let mut pages: Vec<Page> = (1..=10).map(|n| body_page(n, &format!("page body {n}"))).collect();
    // Footer on 4 of 10 pages: above the 30% threshold.
    for page in pages.iter_mut().take(4) {
        page.content.push(ContentItem::new(footer, 9.0, false));
    }

    let repeated = detect_repeated(&pages);
    assert!(repeated.contains(footer));

    let filtered = filter_repeated(pages);
    for page in &filtered {
        assert!(page.content.iter().all(|item| item.text != footer));
        assert_eq!(page.content.len(), 1);
    }
}

#[test]
fn repeated_elements_at_threshold_are_kept() {
    let footer = "Pharmacy Law Handbook - 2nd Edition";
    let mut pages: Vec<Page> = (1..=10).map(|n| body_page(n, &format!("page body {n}"))).collect();
    // Exactly 3 of 10 pages: count must strictly exceed 30%.
    for page in pages.iter_mut().take(3) {
        page.content.push(ContentItem::new(footer, 9.0, false));
    }

    assert!(!detect_repeated(&pages).contains(footer));
}

#[test]
fn short_strings_are_never_boilerplate_candidates() {
    let pages: Vec<Page> = (1..=10).map(|n| body_page(n, "abcde")).collect();
    assert!(detect_repeated(&pages).is_empty());
}

#[test]
fn filter_repeated_is_idempotent() {
    let footer = "Confidential - internal training material";
    let mut pages: Vec<Page> = (1..=6).map(|n| body_page(n, &format!("content {n}"))).collect();
    for page in pages.iter_mut() {
        page.content.push(ContentItem::new(footer, 9.0, false));
    }

    let once = filter_repeated(pages);
    let twice = filter_repeated(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn token_estimate_is_a_quarter_of_the_character_count() {
    let page = Page::new(
        1,
        vec![
            ContentItem::new("HEAD", 16.0, true),
            ContentItem::new("• item", 11.0, false),
            ContentItem::new("body text here", 11.0, false),
        ],
    );
    // "HEAD" (4) + "item" (4) + "body text here" (14) = 22 chars.
    assert_eq!(estimate_page_tokens(&page), 22 / 4);
    assert_eq!(estimate_tokens(&[page.clone(), page]), 2 * (22 / 4));
}

#[test]
fn chunking_packs_greedily_under_the_budget() {
    let pages: Vec<Page> = (1..=5).map(|n| page_with_tokens(n, 100)).collect();
    let chunks = chunk_pages(pages, &ChunkParams { max_tokens: 250 });

    let page_numbers: Vec<Vec<u32>> = chunks
        .iter()
        .map(|c| c.pages.iter().map(|p| p.number).collect())
        .collect();
    assert_eq!(page_numbers, vec![vec![1, 2], vec![3, 4], vec![5]]);
}

#[test]
fn chunking_partitions_the_page_sequence() {
    let sizes = [30usize, 120, 5, 90, 200, 10, 10, 75];
    let pages: Vec<Page> = sizes
        .iter()
        .enumerate()
        .map(|(i, tokens)| page_with_tokens(i as u32 + 1, *tokens))
        .collect();

    let chunks = chunk_pages(pages, &ChunkParams { max_tokens: 150 });

    let flattened: Vec<u32> = chunks
        .iter()
        .flat_map(|c| c.pages.iter().map(|p| p.number))
        .collect();
    let expected: Vec<u32> = (1..=sizes.len() as u32).collect();
    assert_eq!(flattened, expected);
    assert!(chunks.iter().all(|c| !c.pages.is_empty()));
}

#[test]
fn chunks_respect_the_budget_except_for_single_oversized_pages() {
    let pages = vec![
        page_with_tokens(1, 100),
        page_with_tokens(2, 400), // alone over the 250 budget
        page_with_tokens(3, 100),
    ];
    let chunks = chunk_pages(pages, &ChunkParams { max_tokens: 250 });

    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        let total: usize = chunk.pages.iter().map(estimate_page_tokens).sum();
        if chunk.pages.len() > 1 {
            assert!(total <= 250);
        }
    }
    // The oversized page still came through as its own chunk.
    assert_eq!(chunks[1].pages.len(), 1);
    assert_eq!(chunks[1].pages[0].number, 2);
}

#[test]
fn heuristic_grouping_without_headers_caps_topic_size() {
    let pages: Vec<Page> = (1..=7).map(|n| body_page(n, &format!("plain content {n}"))).collect();
    let topics = group_by_topics(&pages, 3);

    let ranges: Vec<(u32, u32)> = topics.iter().map(|t| (t.start_page, t.end_page)).collect();
    assert_eq!(ranges, vec![(1, 3), (4, 6), (7, 7)]);
    assert!(topics.iter().all(|t| t.content.len() <= 3));
    assert_eq!(topics[0].name, "Section starting at page 1");
    assert_eq!(topics[1].name, "Section starting at page 4");
}

#[test]
fn heuristic_grouping_starts_a_topic_on_each_header_page() {
    let pages = vec![
        Page::new(1, vec![ContentItem::new("TEMA UNO", 16.0, true)]),
        // Consecutive header pages intentionally yield adjacent
        // single-page topics.
        Page::new(2, vec![ContentItem::new("TEMA DOS", 16.0, true)]),
        body_page(3, "continuation of tema dos"),
    ];
    let topics = group_by_topics(&pages, 3);

    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].name, "TEMA UNO");
    assert_eq!((topics[0].start_page, topics[0].end_page), (1, 1));
    assert_eq!(topics[1].name, "TEMA DOS");
    assert_eq!((topics[1].start_page, topics[1].end_page), (2, 3));
}

#[test]
fn heuristic_grouping_covers_every_page_exactly_once() {
    let mut pages: Vec<Page> = (1..=9).map(|n| body_page(n, &format!("content {n}"))).collect();
    pages[4].content.insert(0, ContentItem::new("NUEVO TEMA", 16.0, true));

    let topics = group_by_topics(&pages, 3);
    let covered: Vec<u32> = topics
        .iter()
        .flat_map(|t| t.content.iter().map(|s| s.number))
        .collect();
    assert_eq!(covered, (1..=9).collect::<Vec<u32>>());
}

#[test]
fn empty_documents_are_fatal() {
    let err = segment_document(Vec::new(), None, &SegmenterParams::default())
        .expect_err("no pages should be fatal");
    assert!(matches!(err, PipelineError::NoPages));

    let blank = vec![Page::new(1, Vec::new()), Page::new(2, Vec::new())];
    let err = segment_document(blank, None, &SegmenterParams::default())
        .expect_err("pages without content should be fatal");
    assert!(matches!(err, PipelineError::NoPages));
}
