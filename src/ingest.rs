//! Ingestion pipeline orchestration.
//!
//! Coordinates each batch job: connector → normalization → corpus store.
//! Normalization enforces the one hard requirement (a non-empty `name`),
//! derives the slug, and ensures an id. The CMS job additionally merges
//! field-level over existing documents and finishes with an index rebuild.

use anyhow::{bail, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::Config;
use crate::connector_api;
use crate::connector_bulk;
use crate::connector_cms;
use crate::error::CorpusError;
use crate::index;
use crate::models::Document;
use crate::slug::slugify;
use crate::store::CorpusStore;

/// Counters reported at the end of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub fetched: usize,
    pub written: usize,
    pub unchanged: usize,
    pub skipped_unnamed: usize,
    pub skipped_no_id: usize,
    pub skipped_invalid: usize,
    pub duplicates: usize,
}

/// How a normalized record lands in the store.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MergePolicy {
    /// Full overwrite of whatever is at the slug. Scrape/API sources.
    Replace,
    /// Field-level overlay: the source wins on conflict, fields absent from
    /// its payload are preserved from the existing file. Requires a stable
    /// external id. CMS source.
    FieldMerge,
}

pub async fn run_ingest(
    config: &Config,
    source: &str,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let store = CorpusStore::new(config);
    store.ensure_layout()?;

    match source {
        "bulk" => {
            let Some(bulk) = config.sources.bulk.as_ref() else {
                bail!("Bulk source not configured. Set [sources.bulk] in config.");
            };
            let mut items = connector_bulk::scan_bulk(bulk)?;
            if let Some(lim) = limit {
                items.truncate(lim);
            }
            let report = ingest_items(&store, &items, MergePolicy::Replace, dry_run)?;
            print_report("bulk", &report, dry_run);
        }
        "api" => {
            let Some(api) = config.sources.api.as_ref() else {
                bail!("API source not configured. Set [sources.api] in config.");
            };
            let api_key = connector_api::api_key_from_env(api)?;
            let client = reqwest::Client::new();

            let region = connector_api::detect_region(&client, api, &api_key).await?;
            println!("region: {region}");

            let fetch = connector_api::fetch_paginated(&client, &region, &api_key, api).await?;
            let fetched_total = fetch.items.len();
            let mut items = fetch.items;
            if let Some(lim) = limit {
                items.truncate(lim);
            }
            let report = ingest_items(&store, &items, MergePolicy::Replace, dry_run)?;
            print_report("api", &report, dry_run);
            println!("  pages: {}", fetch.pages);

            if let Some(status) = fetch.halted {
                let err = CorpusError::UpstreamUnavailable {
                    status,
                    fetched: fetched_total,
                };
                eprintln!("Warning: {err}; everything fetched before the halt was kept");
            }
        }
        "cms" => {
            let Some(cms) = config.sources.cms.as_ref() else {
                bail!("CMS source not configured. Set [sources.cms] in config.");
            };
            let token = connector_cms::cms_token_from_env(cms)?;
            let client = reqwest::Client::new();

            let mut items = connector_cms::fetch_cms(&client, cms, &token).await?;
            if let Some(lim) = limit {
                items.truncate(lim);
            }
            let report = ingest_items(&store, &items, MergePolicy::FieldMerge, dry_run)?;
            print_report("cms", &report, dry_run);

            // The CMS is the source of truth; finishing with a rebuild keeps
            // the cached index from drifting far from a sync.
            if !dry_run {
                let summary = index::rebuild_index(&store, &config.index)?;
                println!("  index records: {}", summary.records);
                if summary.skipped > 0 {
                    println!("  index skipped (malformed): {}", summary.skipped);
                }
            }
        }
        _ => bail!("Unknown source: '{}'. Available: bulk, api, cms", source),
    }

    println!("ok");
    Ok(())
}

/// Normalize raw payloads and write them to the store in source-iteration
/// order. With `dry_run` nothing is read from or written to the store and
/// `written` counts what would be written.
fn ingest_items(
    store: &CorpusStore,
    items: &[Value],
    policy: MergePolicy,
    dry_run: bool,
) -> Result<IngestReport> {
    let mut report = IngestReport {
        fetched: items.len(),
        ..Default::default()
    };
    let mut seen: HashSet<[u8; 32]> = HashSet::new();

    for item in items {
        let Some(obj) = item.as_object() else {
            report.skipped_invalid += 1;
            continue;
        };

        // The same template often appears in several scrape dump files.
        if !seen.insert(content_hash(item)) {
            report.duplicates += 1;
            continue;
        }

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let Some(name) = name else {
            // Silent skip: partial corpora are expected from noisy sources.
            report.skipped_unnamed += 1;
            continue;
        };

        let external_id = obj.get("id").and_then(id_string);
        if policy == MergePolicy::FieldMerge && external_id.is_none() {
            eprintln!("Warning: skipping CMS record without a stable id: {name:?}");
            report.skipped_no_id += 1;
            continue;
        }

        let slug = match policy {
            MergePolicy::FieldMerge => obj
                .get("slug")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| slugify(name)),
            MergePolicy::Replace => slugify(name),
        };
        if slug.is_empty() {
            eprintln!("Warning: {name:?} yields an empty slug; skipped");
            report.skipped_invalid += 1;
            continue;
        }

        let mut merged = match policy {
            MergePolicy::Replace => obj.clone(),
            MergePolicy::FieldMerge => {
                let existing = if dry_run {
                    Map::new()
                } else {
                    read_existing_fields(store, &slug)?
                };
                overlay(&existing, obj)
            }
        };

        let existing_doc = if dry_run {
            None
        } else {
            store.read_document(&slug).ok()
        };

        merged.insert("slug".to_string(), Value::String(slug.clone()));
        // Numeric source ids are normalized to strings. When the source
        // provides none, the id already filed under this slug is kept so
        // re-runs stay idempotent; only genuinely new documents mint one.
        let id = external_id
            .or_else(|| {
                existing_doc
                    .as_ref()
                    .map(|d| d.id.clone())
                    .filter(|id| !id.is_empty())
            })
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        merged.insert("id".to_string(), Value::String(id));

        let doc: Document = match serde_json::from_value(Value::Object(merged)) {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("Warning: skipping {slug}: {e}");
                report.skipped_invalid += 1;
                continue;
            }
        };

        if dry_run {
            report.written += 1;
            continue;
        }

        if is_unchanged(existing_doc.as_ref(), &doc) {
            report.unchanged += 1;
            continue;
        }

        store.write_document(&slug, &doc)?;
        report.written += 1;
    }

    Ok(report)
}

/// Field-level merge. Every field the authoritative payload provides
/// overwrites the existing value; fields it omits are preserved.
pub fn overlay(existing: &Map<String, Value>, authoritative: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = existing.clone();
    for (key, value) in authoritative {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn read_existing_fields(store: &CorpusStore, slug: &str) -> Result<Map<String, Value>> {
    match store.read_document_value(slug) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(CorpusError::NotFound(_)) => Ok(Map::new()),
        Err(CorpusError::MalformedDocument { slug, .. }) => {
            eprintln!("Warning: existing document {slug} is malformed; treating as empty");
            Ok(Map::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn is_unchanged(existing: Option<&Document>, doc: &Document) -> bool {
    let Some(existing) = existing else {
        return false;
    };
    match (serde_json::to_value(existing), serde_json::to_value(doc)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn content_hash(item: &Value) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(item.to_string().as_bytes());
    hasher.finalize().into()
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn print_report(source: &str, report: &IngestReport, dry_run: bool) {
    if dry_run {
        println!("ingest {source} (dry-run)");
        println!("  fetched: {} items", report.fetched);
        println!("  would write: {} documents", report.written);
    } else {
        println!("ingest {source}");
        println!("  fetched: {} items", report.fetched);
        println!("  written: {} documents", report.written);
        println!("  unchanged: {}", report.unchanged);
    }
    println!("  skipped (no name): {}", report.skipped_unnamed);
    if report.skipped_no_id > 0 {
        println!("  skipped (no id): {}", report.skipped_no_id);
    }
    if report.skipped_invalid > 0 {
        println!("  skipped (invalid): {}", report.skipped_invalid);
    }
    if report.duplicates > 0 {
        println!("  duplicates: {}", report.duplicates);
    }
}
