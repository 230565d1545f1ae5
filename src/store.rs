//! Corpus store: one JSON file per document, named by slug, plus a single
//! aggregated index artifact alongside them.
//!
//! Writers go through write-to-temp-then-rename so a reader never observes a
//! partially written record or index. Every slug passes the path-safety check
//! before any filesystem operation.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::CorpusError;
use crate::models::{Document, IndexRecord};
use crate::slug;

/// File name of the aggregated index artifact inside the corpus directory.
pub const INDEX_FILE: &str = "index.json";

const DOC_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct CorpusStore {
    dir: PathBuf,
}

impl CorpusStore {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.corpus.dir.clone(),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the corpus directory if it does not exist. Idempotent.
    pub fn ensure_layout(&self) -> Result<(), CorpusError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn document_path(&self, slug: &str) -> Result<PathBuf, CorpusError> {
        slug::ensure_safe(slug)?;
        Ok(self.dir.join(format!("{slug}.{DOC_EXT}")))
    }

    /// Read and parse one document. Missing file maps to `NotFound`, a file
    /// that exists but does not parse to `MalformedDocument`.
    pub fn read_document(&self, slug: &str) -> Result<Document, CorpusError> {
        let raw = self.read_raw(slug)?;
        serde_json::from_str(&raw).map_err(|e| CorpusError::MalformedDocument {
            slug: slug.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read one document as an untyped JSON tree. Used by the field-level
    /// merge and the batch clean pass, which must see every field the source
    /// sent.
    pub fn read_document_value(&self, slug: &str) -> Result<Value, CorpusError> {
        let raw = self.read_raw(slug)?;
        serde_json::from_str(&raw).map_err(|e| CorpusError::MalformedDocument {
            slug: slug.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read one document's raw bytes as stored. Used by the download surface,
    /// which serves the file verbatim.
    pub fn read_raw(&self, slug: &str) -> Result<String, CorpusError> {
        let path = self.document_path(slug)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CorpusError::NotFound(slug.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a document, fully replacing any existing file at that slug.
    pub fn write_document(&self, slug: &str, doc: &Document) -> Result<(), CorpusError> {
        let path = self.document_path(slug)?;
        let json = serde_json::to_string_pretty(doc).map_err(|e| {
            CorpusError::MalformedDocument {
                slug: slug.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.write_atomic(&path, json.as_bytes())
    }

    /// Enumerate every persisted document slug, sorted. The index artifact
    /// is excluded. Used by the index builder and batch jobs only; the hot
    /// query path reads the cached index instead.
    pub fn list_slugs(&self) -> Result<Vec<String>, CorpusError> {
        let mut slugs = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(slugs),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == INDEX_FILE {
                continue;
            }
            if let Some(stem) = name.strip_suffix(&format!(".{DOC_EXT}")) {
                slugs.push(stem.to_string());
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Load the index artifact. `NotFound` when it has not been built yet.
    pub fn read_index(&self) -> Result<Vec<IndexRecord>, CorpusError> {
        let path = self.index_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CorpusError::NotFound(INDEX_FILE.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| CorpusError::MalformedDocument {
            slug: INDEX_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace the index artifact atomically. Serialized compactly: at tens
    /// of thousands of records the artifact is multi-megabyte and
    /// pretty-printing roughly doubles it. Returns the byte size written.
    pub fn write_index(&self, records: &[IndexRecord]) -> Result<u64, CorpusError> {
        let json = serde_json::to_string(records).map_err(|e| CorpusError::MalformedDocument {
            slug: INDEX_FILE.to_string(),
            reason: e.to_string(),
        })?;
        self.write_atomic(&self.index_path(), json.as_bytes())?;
        Ok(json.len() as u64)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CorpusError> {
        let tmp = path.with_extension(format!("{DOC_EXT}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(name: &str, slug: &str) -> Document {
        serde_json::from_value(serde_json::json!({
            "id": format!("id-{slug}"),
            "name": name,
            "slug": slug,
        }))
        .unwrap()
    }

    #[test]
    fn test_write_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        store.write_document("alpha", &doc("Alpha", "alpha")).unwrap();
        let read = store.read_document("alpha").unwrap();
        assert_eq!(read.name, "Alpha");
        assert_eq!(read.slug, "alpha");
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        match store.read_document("ghost") {
            Err(CorpusError::NotFound(slug)) => assert_eq!(slug, "ghost"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unsafe_slug_rejected_before_io() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());

        // The store directory was never created; a traversal slug must fail
        // on validation, not on a filesystem error.
        match store.read_raw("../outside") {
            Err(CorpusError::InvalidIdentifier(_)) => {}
            other => panic!("expected InvalidIdentifier, got {other:?}"),
        }
        match store.write_document("a/b", &doc("X", "a/b")) {
            Err(CorpusError::InvalidIdentifier(_)) => {}
            other => panic!("expected InvalidIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn test_list_slugs_excludes_index_artifact() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        store.write_document("beta", &doc("Beta", "beta")).unwrap();
        store.write_document("alpha", &doc("Alpha", "alpha")).unwrap();
        store.write_index(&[]).unwrap();

        assert_eq!(store.list_slugs().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_malformed_document_reported() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        std::fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();
        match store.read_document("broken") {
            Err(CorpusError::MalformedDocument { slug, .. }) => assert_eq!(slug, "broken"),
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_index_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();
        assert!(store.read_index().unwrap_err().is_not_found());
    }

    #[test]
    fn test_index_roundtrip_compact() {
        let tmp = TempDir::new().unwrap();
        let store = CorpusStore::from_dir(tmp.path());
        store.ensure_layout().unwrap();

        let records = vec![IndexRecord {
            id: "t-1".into(),
            name: "Alpha".into(),
            slug: "alpha".into(),
            description: "d".into(),
            category: "Sales".into(),
            tags: vec!["slack".into()],
            price: 0.0,
            usage: 10,
        }];
        let bytes = store.write_index(&records).unwrap();
        assert!(bytes > 0);

        let raw = std::fs::read_to_string(store.index_path()).unwrap();
        assert!(!raw.contains('\n'), "index must be serialized compactly");
        assert_eq!(store.read_index().unwrap(), records);
    }
}
