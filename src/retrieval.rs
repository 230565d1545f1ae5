//! Retrieval selector: picks the top-k cleaned documents for prompt context.
//!
//! The signal is intentionally coarse: keyword containment against the
//! cleaned document's identifier (its filename), not its body. A small
//! random jitter breaks ties so repeated no-match queries do not always
//! surface the same default order. This is a documented precision
//! limitation, not a defect; changing it means re-specifying the scoring
//! contract.

use anyhow::Result;
use rand::Rng;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::models::ContextChunk;
use crate::store::CorpusStore;

/// Split a free-text query into lower-cased alphanumeric runs, discarding
/// tokens of length <= 2 as non-discriminating.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Score every candidate identifier and return them sorted best-first.
///
/// Score = number of query tokens the identifier contains, plus a uniform
/// jitter in `[0, jitter)`. Ties beyond the jitter fall back to identifier
/// order, so one process run ranks deterministically.
pub fn rank<R: Rng>(
    candidates: &[String],
    tokens: &[String],
    jitter: f64,
    rng: &mut R,
) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = candidates
        .iter()
        .map(|candidate| {
            let lowered = candidate.to_lowercase();
            let hits = tokens
                .iter()
                .filter(|token| lowered.contains(token.as_str()))
                .count() as f64;
            let noise = if jitter > 0.0 {
                rng.gen_range(0.0..jitter)
            } else {
                0.0
            };
            (candidate.clone(), hits + noise)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored
}

/// Select the top-`k` cleaned documents for `query` and format them as
/// tagged context chunks.
///
/// A missing cleaned directory yields an empty sequence; "no context" is a
/// valid, non-fatal outcome and callers proceed without augmentation.
pub fn select_context(
    cleaned_dir: &Path,
    query: &str,
    k: usize,
    jitter: f64,
) -> Result<Vec<ContextChunk>> {
    if !cleaned_dir.is_dir() {
        return Ok(Vec::new());
    }

    let candidates = list_cleaned_slugs(cleaned_dir)?;
    let tokens = tokenize(query);
    let ranked = rank(&candidates, &tokens, jitter, &mut rand::thread_rng());

    let mut chunks = Vec::with_capacity(k.min(ranked.len()));
    for (slug, _score) in ranked {
        if chunks.len() == k {
            break;
        }
        let path = cleaned_dir.join(format!("{slug}.json"));
        match fs::read_to_string(&path) {
            Ok(body) => chunks.push(ContextChunk {
                text: format!("### Template: {slug}\n{body}"),
                slug,
            }),
            Err(e) => {
                eprintln!("Warning: failed to read {}: {}", path.display(), e);
            }
        }
    }

    Ok(chunks)
}

fn list_cleaned_slugs(cleaned_dir: &Path) -> Result<Vec<String>> {
    let mut slugs = Vec::new();
    for entry in fs::read_dir(cleaned_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(stem) = name.strip_suffix(".json") {
            slugs.push(stem.to_string());
        }
    }
    slugs.sort();
    Ok(slugs)
}

/// CLI entry point: print the selected context chunks.
pub fn run_context(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    let k = k.unwrap_or(config.retrieval.context_k);
    let chunks = select_context(
        &config.corpus.cleaned_dir,
        query,
        k,
        config.retrieval.jitter,
    )?;

    if chunks.is_empty() {
        println!("No context available.");
        return Ok(());
    }

    for chunk in &chunks {
        println!("{}", chunk.text);
        println!();
    }
    println!("selected {} chunks", chunks.len());
    Ok(())
}

/// Batch clean pass: sanitize every document into the cleaned directory.
///
/// The cleaned copies are derived artifacts (the canonical files are never
/// mutated) and are what the retrieval selector serves from.
pub fn run_clean(config: &Config) -> Result<()> {
    let store = CorpusStore::new(config);
    let cleaned_dir = &config.corpus.cleaned_dir;
    fs::create_dir_all(cleaned_dir)?;

    let slugs = store.list_slugs()?;
    let mut written = 0usize;
    let mut skipped = 0usize;

    for slug in &slugs {
        match store.read_document_value(slug) {
            Ok(value) => {
                let cleaned = crate::sanitize::clean(&value);
                let json = serde_json::to_string_pretty(&cleaned)?;
                fs::write(cleaned_dir.join(format!("{slug}.json")), json)?;
                written += 1;
            }
            Err(crate::error::CorpusError::MalformedDocument { slug, reason }) => {
                skipped += 1;
                eprintln!("Warning: skipping malformed document {slug}: {reason}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("clean");
    println!("  documents: {}", slugs.len());
    println!("  cleaned copies: {written}");
    println!("  skipped (malformed): {skipped}");
    println!("ok");
    Ok(())
}
