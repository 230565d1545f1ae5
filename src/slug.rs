//! Slug derivation and path-safety validation.
//!
//! A slug is the stable, URL-safe identifier a document is filed under. It is
//! derived once at ingestion time and treated as immutable afterwards.

use crate::error::CorpusError;

/// Derive a URL-safe slug from a human-readable name.
///
/// Lower-cases the input, collapses whitespace runs to a single hyphen,
/// strips everything outside `[a-z0-9_-]`, collapses hyphen runs, and trims
/// leading/trailing hyphens. Deterministic: no randomness, no locale
/// dependence.
///
/// Two distinct names can slugify to the same value; the store's
/// last-writer-wins overwrite is the accepted collision policy (see
/// DESIGN.md).
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut prev_hyphen = false;

    for ch in lowered.chars() {
        let mapped = if ch.is_whitespace() {
            Some('-')
        } else if ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            Some(ch)
        } else {
            None
        };

        if let Some(c) = mapped {
            if c == '-' {
                if !prev_hyphen {
                    out.push('-');
                }
                prev_hyphen = true;
            } else {
                out.push(c);
                prev_hyphen = false;
            }
        }
    }

    out.trim_matches('-').to_string()
}

/// Reject slugs that could escape the corpus directory.
///
/// Any path-traversal sequence or embedded separator fails with
/// `InvalidIdentifier` before a filesystem operation is attempted. This runs
/// on every store access and on the download surface. It is a security
/// invariant, not input normalization, so the slug is never rewritten and
/// retried.
pub fn ensure_safe(slug: &str) -> Result<(), CorpusError> {
    if slug.is_empty()
        || slug.contains("..")
        || slug.contains('/')
        || slug.contains('\\')
        || slug.contains('\0')
    {
        return Err(CorpusError::InvalidIdentifier(slug.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_example() {
        assert_eq!(
            slugify("Auto-Sync Notion to Slack!!"),
            "auto-sync-notion-to-slack"
        );
    }

    #[test]
    fn test_slugify_deterministic() {
        let name = "Weekly KPI Digest (v2)";
        assert_eq!(slugify(name), slugify(name));
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a   b"), "a-b");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("  padded  "), "padded");
    }

    #[test]
    fn test_slugify_keeps_underscore_and_digits() {
        assert_eq!(slugify("invoice_2024 sync"), "invoice_2024-sync");
    }

    #[test]
    fn test_slugify_strips_non_ascii() {
        assert_eq!(slugify("Café Orders → Sheet"), "caf-orders-sheet");
    }

    #[test]
    fn test_ensure_safe_rejects_traversal() {
        assert!(ensure_safe("../etc/passwd").is_err());
        assert!(ensure_safe("a/b").is_err());
        assert!(ensure_safe("a\\b").is_err());
        assert!(ensure_safe("").is_err());
        assert!(ensure_safe("auto-sync-notion-to-slack").is_ok());
    }
}
