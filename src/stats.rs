//! Corpus and index overview.
//!
//! Provides a quick summary of what's in the store: document counts, index
//! record counts, artifact size and age, and the most common categories.
//! Used by `fdx stats` to give confidence that ingestion runs and index
//! rebuilds are doing what they should.

use anyhow::Result;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::CorpusError;
use crate::store::CorpusStore;

pub fn run_stats(config: &Config) -> Result<()> {
    let store = CorpusStore::new(config);

    let doc_count = store.list_slugs()?.len();
    let index_records = match store.read_index() {
        Ok(records) => Some(records),
        Err(e) if e.is_not_found() => None,
        Err(CorpusError::MalformedDocument { reason, .. }) => {
            eprintln!("Warning: index artifact is malformed: {reason}");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let index_meta = std::fs::metadata(store.index_path()).ok();
    let index_size = index_meta.as_ref().map(|m| m.len()).unwrap_or(0);
    let index_age = index_meta
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64);

    let cleaned_count = std::fs::read_dir(&config.corpus.cleaned_dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0);

    println!("flowdex — Corpus Stats");
    println!("======================");
    println!();
    println!("  Corpus:      {}", store.dir().display());
    println!("  Documents:   {doc_count}");
    println!("  Cleaned:     {cleaned_count}");
    println!();

    match index_records {
        Some(records) => {
            println!("  Index:       {} records", records.len());
            println!("  Size:        {}", format_bytes(index_size));
            match index_age {
                Some(ts) => println!("  Rebuilt:     {}", format_ts_relative(ts)),
                None => println!("  Rebuilt:     unknown"),
            }
            if records.len() != doc_count {
                println!(
                    "  Stale:       index has {} records for {} documents (run `fdx reindex`)",
                    records.len(),
                    doc_count
                );
            }

            let mut by_category: HashMap<&str, usize> = HashMap::new();
            for record in &records {
                *by_category.entry(record.category.as_str()).or_insert(0) += 1;
            }
            let mut categories: Vec<(&str, usize)> = by_category.into_iter().collect();
            categories.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

            if !categories.is_empty() {
                println!();
                println!("  By category:");
                println!("  {:<28} {:>6}", "CATEGORY", "DOCS");
                println!("  {}", "-".repeat(36));
                for (category, count) in categories.iter().take(8) {
                    println!("  {category:<28} {count:>6}");
                }
            }
        }
        None => {
            println!("  Index:       not built yet (run `fdx reindex`)");
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
