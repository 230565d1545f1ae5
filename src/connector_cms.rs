use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::config::CmsSourceConfig;

/// Read the CMS bearer token from the configured environment variable.
pub fn cms_token_from_env(config: &CmsSourceConfig) -> Result<String> {
    std::env::var(&config.token_env)
        .with_context(|| format!("{} environment variable not set", config.token_env))
}

/// Fetch every template record from the CMS collection, page by page.
///
/// The CMS is the authoritative source: its records are merged field-level
/// over existing documents by the ingest step. Any non-success response is
/// fatal here: unlike the public API job, a partial read of the source of
/// truth is not a useful state.
pub async fn fetch_cms(
    client: &reqwest::Client,
    config: &CmsSourceConfig,
    token: &str,
) -> Result<Vec<Value>> {
    let base = config.base_url.trim_end_matches('/');
    let mut records: Vec<Value> = Vec::new();
    let mut offset = 0usize;

    loop {
        let url = format!(
            "{}/items/templates?limit={}&offset={}",
            base, config.page_size, offset
        );
        let resp = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !resp.status().is_success() {
            bail!("CMS request failed (HTTP {}): {}", resp.status(), url);
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Invalid JSON from {url}"))?;
        let page = match body.get("data").and_then(Value::as_array) {
            Some(data) => data.clone(),
            None => bail!("CMS response missing 'data' array: {url}"),
        };

        if page.is_empty() {
            break;
        }
        offset += page.len();
        records.extend(page);
    }

    Ok(records)
}
