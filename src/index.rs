//! Index builder: full recomputation of the aggregated index artifact.
//!
//! The index is a derived, rebuildable projection of the corpus: it holds
//! nothing that cannot be recomputed from the per-document files, and it is
//! never patched incrementally. Staleness between rebuilds is an accepted,
//! explicit condition.

use anyhow::Result;

use crate::config::{Config, IndexConfig};
use crate::error::CorpusError;
use crate::models::{Document, IndexRecord, DEFAULT_CATEGORY};
use crate::stats::format_bytes;
use crate::store::CorpusStore;

/// What a rebuild produced, for observability.
#[derive(Debug)]
pub struct IndexSummary {
    pub records: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Rebuild the index artifact from every document in the store.
///
/// A single malformed file is skipped and logged, never aborting the whole
/// rebuild. An empty corpus produces an empty index, not an error. The
/// artifact replaces any prior version atomically.
pub fn rebuild_index(store: &CorpusStore, config: &IndexConfig) -> Result<IndexSummary, CorpusError> {
    let slugs = store.list_slugs()?;
    let mut records = Vec::with_capacity(slugs.len());
    let mut skipped = 0usize;

    for slug in &slugs {
        match store.read_document(slug) {
            Ok(doc) => records.push(project(&doc, config.description_max_chars)),
            Err(CorpusError::MalformedDocument { slug, reason }) => {
                skipped += 1;
                eprintln!("Warning: skipping malformed document {slug}: {reason}");
            }
            Err(e) => return Err(e),
        }
    }

    let bytes = store.write_index(&records)?;
    Ok(IndexSummary {
        records: records.len(),
        skipped,
        bytes,
    })
}

/// Project one document to its index record.
fn project(doc: &Document, description_max_chars: usize) -> IndexRecord {
    let description = doc
        .description
        .as_deref()
        .map(|d| truncate_chars(&collapse_whitespace(d), description_max_chars))
        .unwrap_or_default();

    let category = doc
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string();

    IndexRecord {
        id: doc.id.clone(),
        name: doc.name.clone(),
        slug: doc.slug.clone(),
        description,
        category,
        tags: doc.tags.clone(),
        price: doc.price.max(0.0),
        usage: doc.usage,
    }
}

/// Collapse internal whitespace runs (including newlines) to single spaces.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// CLI entry point: rebuild and print a summary.
pub fn run_reindex(config: &Config) -> Result<()> {
    let store = CorpusStore::new(config);
    store.ensure_layout()?;

    let summary = rebuild_index(&store, &config.index)?;

    println!("reindex");
    println!("  index records: {}", summary.records);
    println!("  skipped (malformed): {}", summary.skipped);
    println!(
        "  artifact: {} ({})",
        store.index_path().display(),
        format_bytes(summary.bytes)
    );
    println!("ok");
    Ok(())
}
