use std::env;
use std::fs;
use std::process::ExitCode;

use llm_provider::{default_config, AnthropicClient, TextCompletion};
use log::info;
use study_model::Page;
use text_pipeline::{
    chunk_pages, estimate_tokens, filter_repeated, segment_document, ChunkParams, SegmenterParams,
};

fn print_usage() {
    eprintln!(
        "Usage:\n\
         topic-viewer chunks PAGES_JSON [--max-tokens N]\n\
         topic-viewer segment PAGES_JSON [--max-tokens N] [--max-pages N] [--api-key KEY]\n\
         \n\
         PAGES_JSON is a file holding the extracted pages as a JSON array.\n\
         segment uses the completion API when --api-key or ANTHROPIC_API_KEY is set,\n\
         and falls back to the header heuristic otherwise.\n"
    );
}

fn load_pages(path: &str) -> Result<Vec<Page>, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("cannot parse {path}: {e}"))
}

fn parse_flag(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

fn run_chunks(path: &str, args: &[String]) -> Result<(), String> {
    let pages = load_pages(path)?;
    let mut params = ChunkParams::default();
    if let Some(v) = parse_flag(args, "--max-tokens") {
        params.max_tokens = v.parse().map_err(|_| "--max-tokens requires a number".to_string())?;
    }

    let pages = filter_repeated(pages);
    println!("{} page(s), ~{} token(s) total", pages.len(), estimate_tokens(&pages));

    let chunks = chunk_pages(pages, &params);
    for (i, chunk) in chunks.iter().enumerate() {
        let tokens = estimate_tokens(&chunk.pages);
        println!(
            "chunk {}: pages {}-{} ({} pages, ~{} tokens)",
            i + 1,
            chunk.start_page(),
            chunk.end_page(),
            chunk.pages.len(),
            tokens
        );
    }
    Ok(())
}

fn run_segment(path: &str, args: &[String]) -> Result<(), String> {
    let pages = load_pages(path)?;
    let mut params = SegmenterParams::default();
    if let Some(v) = parse_flag(args, "--max-tokens") {
        params.max_chunk_tokens =
            v.parse().map_err(|_| "--max-tokens requires a number".to_string())?;
    }
    if let Some(v) = parse_flag(args, "--max-pages") {
        params.max_pages_per_topic =
            v.parse().map_err(|_| "--max-pages requires a number".to_string())?;
    }

    let api_key = parse_flag(args, "--api-key").or_else(|| env::var("ANTHROPIC_API_KEY").ok());
    let client = match api_key {
        Some(key) => {
            let client = AnthropicClient::new(default_config(key))
                .map_err(|e| format!("completion client: {e}"))?;
            info!("segmenting with model {}", client.model());
            Some(client)
        }
        None => {
            info!("no API key; using header heuristic only");
            None
        }
    };

    let client_ref = client.as_ref().map(|c| c as &dyn TextCompletion);
    let report =
        segment_document(pages, client_ref, &params).map_err(|e| e.to_string())?;

    for topic in &report.topics {
        println!("pages {:>3}-{:<3}  {}", topic.start_page, topic.end_page, topic.name);
    }
    if report.is_degraded() {
        println!();
        for degraded in &report.degraded {
            println!(
                "note: pages {}-{} grouped heuristically ({})",
                degraded.start_page, degraded.end_page, degraded.reason
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, path, rest) = match (args.first(), args.get(1)) {
        (Some(command), Some(path)) => (command.as_str(), path.as_str(), &args[2..]),
        _ => {
            print_usage();
            return ExitCode::from(2);
        }
    };

    let result = match command {
        "chunks" => run_chunks(path, rest),
        "segment" => run_segment(path, rest),
        _ => {
            print_usage();
            return ExitCode::from(2);
        }
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
