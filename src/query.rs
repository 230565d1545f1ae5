//! Query engine: filtered, paginated views over the cached index.
//!
//! The index is loaded once and cached for the process lifetime. There is no
//! implicit invalidation: an explicit [`IndexCache::reload`] (wired to the
//! rebuild completion hook and operator actions) is the only refresh, which
//! keeps staleness behavior auditable.

use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::error::CorpusError;
use crate::models::{Complexity, IndexRecord};
use crate::store::CorpusStore;

/// Sentinel category meaning "do not filter".
pub const CATEGORY_ALL: &str = "All";

#[derive(Debug, Clone)]
pub struct QueryParams {
    /// 1-indexed page number.
    pub page: usize,
    pub page_size: usize,
    pub search: Option<String>,
    pub category: Option<String>,
    pub complexity: Option<Complexity>,
}

impl QueryParams {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            search: None,
            category: None,
            complexity: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryOutcome {
    pub records: Vec<IndexRecord>,
    /// Filtered count, before pagination.
    pub total: usize,
}

impl QueryOutcome {
    /// Whether pages beyond the requested one remain.
    pub fn has_more(&self, params: &QueryParams) -> bool {
        self.total > params.page * params.page_size
    }
}

/// Process-wide cache of the index artifact.
///
/// Readers share one immutable snapshot through an `Arc`; concurrent queries
/// never observe a half-written cache because a reload swaps the whole
/// snapshot under the write lock.
#[derive(Debug, Default)]
pub struct IndexCache {
    inner: RwLock<Option<Arc<Vec<IndexRecord>>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot, loading it on first use. A missing index
    /// artifact caches as an empty snapshot; "no data yet" is a valid
    /// state, not an error.
    pub fn get_or_load(&self, store: &CorpusStore) -> Result<Arc<Vec<IndexRecord>>, CorpusError> {
        if let Some(snapshot) = self.read_snapshot() {
            return Ok(snapshot);
        }

        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(snapshot) = guard.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(Self::load(store)?);
        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Re-read the artifact and swap the snapshot. Returns the record count.
    pub fn reload(&self, store: &CorpusStore) -> Result<usize, CorpusError> {
        let snapshot = Arc::new(Self::load(store)?);
        let count = snapshot.len();
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(snapshot);
        Ok(count)
    }

    fn read_snapshot(&self) -> Option<Arc<Vec<IndexRecord>>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone)
    }

    fn load(store: &CorpusStore) -> Result<Vec<IndexRecord>, CorpusError> {
        match store.read_index() {
            Ok(records) => Ok(records),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// Filter and paginate one index snapshot.
///
/// Filters compose with logical AND in a fixed order: category exact match
/// (skipped for the `All` sentinel), complexity tier, then case-insensitive
/// substring search over name, description, and slug. Pagination is
/// 1-indexed and clamped: a page past the end yields empty records with the
/// correct total.
pub fn execute(records: &[IndexRecord], params: &QueryParams) -> QueryOutcome {
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(CATEGORY_ALL));
    let needle = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let filtered: Vec<&IndexRecord> = records
        .iter()
        .filter(|r| category.map_or(true, |c| r.category == c))
        .filter(|r| {
            params
                .complexity
                .map_or(true, |tier| Complexity::from_usage(r.usage) == tier)
        })
        .filter(|r| {
            needle.as_deref().map_or(true, |n| {
                r.name.to_lowercase().contains(n)
                    || r.description.to_lowercase().contains(n)
                    || r.slug.to_lowercase().contains(n)
            })
        })
        .collect();

    let total = filtered.len();
    let page = params.page.max(1);
    let start = (page - 1).saturating_mul(params.page_size);
    let end = start.saturating_add(params.page_size).min(total);

    let records = if start >= total {
        Vec::new()
    } else {
        filtered[start..end].iter().map(|r| (*r).clone()).collect()
    };

    QueryOutcome { records, total }
}

/// CLI entry point: run one query against the on-disk index and print the
/// matching records.
pub fn run_query(
    config: &crate::config::Config,
    search: Option<String>,
    page: usize,
    page_size: Option<usize>,
    category: Option<String>,
    complexity: Option<String>,
) -> anyhow::Result<()> {
    let complexity = match complexity {
        Some(raw) => Some(Complexity::parse(&raw).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown complexity: '{}'. Use Beginner, Intermediate, or Advanced.",
                raw
            )
        })?),
        None => None,
    };

    let store = CorpusStore::new(config);
    let cache = IndexCache::new();
    let snapshot = cache.get_or_load(&store)?;

    let params = QueryParams {
        page: page.max(1),
        page_size: page_size.unwrap_or(config.query.default_page_size),
        search,
        category,
        complexity,
    };
    let outcome = execute(&snapshot, &params);

    if outcome.records.is_empty() {
        println!("No results.");
        println!("  total matches: {}", outcome.total);
        return Ok(());
    }

    let offset = (params.page - 1) * params.page_size;
    for (i, record) in outcome.records.iter().enumerate() {
        let tier = Complexity::from_usage(record.usage);
        println!("{}. {} [{}]", offset + i + 1, record.name, tier);
        println!("    category: {}  price: {}", record.category, record.price);
        if !record.tags.is_empty() {
            println!("    apps: {}", record.tags.join(", "));
        }
        if !record.description.is_empty() {
            println!("    {}", record.description);
        }
        println!("    slug: {}", record.slug);
        println!();
    }

    let pages = outcome.total.div_ceil(params.page_size);
    println!(
        "page {} of {} ({} matches)",
        params.page, pages, outcome.total
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(slug: &str, category: &str, usage: u64) -> IndexRecord {
        IndexRecord {
            id: format!("id-{slug}"),
            name: slug.replace('-', " "),
            slug: slug.to_string(),
            description: format!("workflow for {slug}"),
            category: category.to_string(),
            tags: Vec::new(),
            price: 0.0,
            usage,
        }
    }

    fn corpus(n: usize) -> Vec<IndexRecord> {
        (0..n).map(|i| record(&format!("doc-{i:02}"), "Sales", 0)).collect()
    }

    #[test]
    fn test_pagination_partial_last_page() {
        let records = corpus(55);
        let outcome = execute(&records, &QueryParams::new(3, 20));
        assert_eq!(outcome.records.len(), 15);
        assert_eq!(outcome.total, 55);
        assert!(!outcome.has_more(&QueryParams::new(3, 20)));
    }

    #[test]
    fn test_pagination_past_end_is_empty_not_error() {
        let records = corpus(55);
        let params = QueryParams::new(10, 20);
        let outcome = execute(&records, &params);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.total, 55);
    }

    #[test]
    fn test_has_more() {
        let records = corpus(55);
        let params = QueryParams::new(1, 20);
        assert!(execute(&records, &params).has_more(&params));
    }

    #[test]
    fn test_filter_composition() {
        let records = vec![
            record("a", "Sales", 0),
            record("b", "Sales", 0),
            record("c", "IT", 0),
        ];

        let mut params = QueryParams::new(1, 20);
        params.category = Some("Sales".to_string());
        let outcome = execute(&records, &params);
        let slugs: Vec<&str> = outcome.records.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b"]);

        params.search = Some("nonexistent-term".to_string());
        let outcome = execute(&records, &params);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn test_category_all_sentinel_skips_filter() {
        let records = vec![record("a", "Sales", 0), record("c", "IT", 0)];
        let mut params = QueryParams::new(1, 20);
        params.category = Some("All".to_string());
        assert_eq!(execute(&records, &params).total, 2);
    }

    #[test]
    fn test_complexity_filter_derived_from_usage() {
        let records = vec![
            record("starter", "Sales", 5),
            record("mid", "Sales", 500),
            record("pro", "Sales", 5000),
        ];
        let mut params = QueryParams::new(1, 20);
        params.complexity = Some(Complexity::Intermediate);
        let outcome = execute(&records, &params);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].slug, "mid");
    }

    #[test]
    fn test_search_case_insensitive_over_name_description_slug() {
        let records = vec![
            record("auto-sync-notion-to-slack", "Sales", 0),
            record("daily-report", "Sales", 0),
        ];
        let mut params = QueryParams::new(1, 20);
        params.search = Some("NOTION".to_string());
        assert_eq!(execute(&records, &params).total, 1);

        params.search = Some("workflow for daily".to_string());
        assert_eq!(execute(&records, &params).total, 1);
    }

    #[test]
    fn test_cache_degrades_gracefully_without_index() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        let cache = IndexCache::new();
        let snapshot = cache.get_or_load(&store).unwrap();
        assert!(snapshot.is_empty());

        let outcome = execute(&snapshot, &QueryParams::new(1, 20));
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn test_cache_serves_stale_until_reload() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        let cache = IndexCache::new();
        assert!(cache.get_or_load(&store).unwrap().is_empty());

        store.write_index(&[record("late", "Sales", 0)]).unwrap();
        // Still the cached snapshot: no implicit invalidation.
        assert!(cache.get_or_load(&store).unwrap().is_empty());

        assert_eq!(cache.reload(&store).unwrap(), 1);
        assert_eq!(cache.get_or_load(&store).unwrap().len(), 1);
    }
}
