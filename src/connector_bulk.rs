use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::BulkSourceConfig;

/// Scan a bulk scrape dump and return the raw document payloads it contains.
///
/// The configured path may be a single payload file or a directory scanned
/// recursively with the include globs.
pub fn scan_bulk(config: &BulkSourceConfig) -> Result<Vec<Value>> {
    let path = &config.path;
    if !path.exists() {
        bail!("Bulk source path does not exist: {}", path.display());
    }

    if path.is_file() {
        return read_payload(path);
    }

    let include_set = build_globset(&config.include_globs)?;
    let mut items = Vec::new();

    for entry in WalkDir::new(path) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(path).unwrap_or(entry.path());
        if !include_set.is_match(rel.to_string_lossy().as_ref()) {
            continue;
        }
        match read_payload(entry.path()) {
            Ok(batch) => items.extend(batch),
            Err(e) => {
                eprintln!("Warning: skipping {}: {}", entry.path().display(), e);
            }
        }
    }

    Ok(items)
}

fn read_payload(path: &Path) -> Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file: {}", path.display()))?;
    let payload: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse payload file: {}", path.display()))?;
    Ok(extract_items(&payload))
}

/// Flatten a raw payload into a sequence of document-shaped values.
///
/// Scrape dumps arrive in several shapes: a bare array, an object carrying a
/// `templates` or `scenarios` array, or a plain map keyed by arbitrary ids.
/// The map case is a best-effort fallback: its values are taken as
/// documents and anything that is not one is dropped later by the name
/// check in ingest.
pub fn extract_items(payload: &Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            for field in ["templates", "scenarios"] {
                if let Some(Value::Array(items)) = map.get(field) {
                    return items.clone();
                }
            }
            map.values().cloned().collect()
        }
        _ => Vec::new(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_bare_array() {
        let payload = json!([{ "name": "A" }, { "name": "B" }]);
        assert_eq!(extract_items(&payload).len(), 2);
    }

    #[test]
    fn test_extract_templates_field() {
        let payload = json!({ "templates": [{ "name": "A" }], "total": 1 });
        let items = extract_items(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "A");
    }

    #[test]
    fn test_extract_scenarios_field() {
        let payload = json!({ "scenarios": [{ "name": "A" }, { "name": "B" }] });
        assert_eq!(extract_items(&payload).len(), 2);
    }

    #[test]
    fn test_extract_map_fallback() {
        let payload = json!({
            "tpl_1": { "name": "A" },
            "tpl_2": { "name": "B" }
        });
        assert_eq!(extract_items(&payload).len(), 2);
    }

    #[test]
    fn test_extract_scalar_payload_is_empty() {
        assert!(extract_items(&json!("nope")).is_empty());
        assert!(extract_items(&json!(3)).is_empty());
    }
}
