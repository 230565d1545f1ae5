//! Single-document retrieval and export by slug.
//!
//! Used by the `fdx get` / `fdx export` CLI commands and the
//! `GET /templates/{slug}` HTTP endpoints.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::error::CorpusError;
use crate::models::{Complexity, Document};
use crate::store::CorpusStore;

/// Look up one document. A file that exists but does not parse is reported
/// as `NotFound` to the caller; a corrupt record must not crash a lookup.
pub fn get_document(store: &CorpusStore, slug: &str) -> Result<Document, CorpusError> {
    match store.read_document(slug) {
        Ok(doc) => Ok(doc),
        Err(CorpusError::MalformedDocument { slug, reason }) => {
            eprintln!("Warning: document {slug} is malformed: {reason}");
            Err(CorpusError::NotFound(slug))
        }
        Err(e) => Err(e),
    }
}

/// CLI entry point. Prints one document to stdout.
pub fn run_get(config: &Config, slug: &str) -> Result<()> {
    let store = CorpusStore::new(config);
    let doc = match get_document(&store, slug) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("--- Template ---");
    println!("slug:        {}", doc.slug);
    println!("name:        {}", doc.name);
    println!("id:          {}", doc.id);
    println!(
        "category:    {}",
        doc.category.as_deref().unwrap_or("(none)")
    );
    println!("complexity:  {}", Complexity::from_usage(doc.usage));
    println!("price:       {}", doc.price);
    println!("usage:       {}", doc.usage);
    if !doc.tags.is_empty() {
        println!("apps:        {}", doc.tags.join(", "));
    }
    if let Some(ref description) = doc.description {
        println!("description: {description}");
    }

    if !doc.extra.is_empty() {
        println!();
        println!("--- Body ---");
        println!("{}", serde_json::to_string_pretty(&doc.extra)?);
    }

    Ok(())
}

/// Export one document's raw JSON, verbatim as stored.
///
/// The download filename is `<slug>.json`; the slug passes the same
/// path-safety check as every other store access before any lookup happens.
pub fn run_export(config: &Config, slug: &str, output: Option<&Path>) -> Result<()> {
    let store = CorpusStore::new(config);
    let raw = match store.read_raw(slug) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &raw)?;
            eprintln!("Exported {} to {}", download_filename(slug), path.display());
        }
        None => {
            println!("{raw}");
        }
    }

    Ok(())
}

/// Filename offered to download clients for a given slug.
pub fn download_filename(slug: &str) -> String {
    format!("{slug}.json")
}
