use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Directory holding one JSON file per document plus the index artifact.
    pub dir: PathBuf,
    /// Directory the batch clean pass writes sanitized copies into.
    pub cleaned_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            description_max_chars: default_description_max_chars(),
        }
    }
}

fn default_description_max_chars() -> usize {
    150
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_context_k")]
    pub context_k: usize,
    /// Upper bound of the uniform tie-breaking jitter added to scores.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_k: default_context_k(),
            jitter: default_jitter(),
        }
    }
}

fn default_context_k() -> usize {
    3
}

fn default_jitter() -> f64 {
    0.1
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    pub bulk: Option<BulkSourceConfig>,
    pub api: Option<ApiSourceConfig>,
    pub cms: Option<CmsSourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BulkSourceConfig {
    /// A payload file, or a directory of payload files scanned recursively.
    pub path: PathBuf,
    #[serde(default = "default_bulk_globs")]
    pub include_globs: Vec<String>,
}

fn default_bulk_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSourceConfig {
    /// Regional base URLs probed in order; the first one that authenticates
    /// is used for the whole run.
    pub regions: Vec<String>,
    #[serde(default = "default_api_page_size")]
    pub page_size: usize,
    /// Pause between pages. Politeness toward the upstream source, not an
    /// optimization knob.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_page_size() -> usize {
    50
}

fn default_page_delay_ms() -> u64 {
    250
}

fn default_api_key_env() -> String {
    "FLOWDEX_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CmsSourceConfig {
    pub base_url: String,
    #[serde(default = "default_cms_page_size")]
    pub page_size: usize,
    #[serde(default = "default_cms_token_env")]
    pub token_env: String,
}

fn default_cms_page_size() -> usize {
    100
}

fn default_cms_token_env() -> String {
    "FLOWDEX_CMS_TOKEN".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.index.description_max_chars == 0 {
        anyhow::bail!("index.description_max_chars must be > 0");
    }

    if config.query.default_page_size == 0 {
        anyhow::bail!("query.default_page_size must be > 0");
    }

    if config.retrieval.context_k < 1 {
        anyhow::bail!("retrieval.context_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.retrieval.jitter) {
        anyhow::bail!("retrieval.jitter must be in [0.0, 1.0]");
    }

    if let Some(ref api) = config.sources.api {
        if api.regions.is_empty() {
            anyhow::bail!("sources.api.regions must not be empty");
        }
        if api.page_size == 0 {
            anyhow::bail!("sources.api.page_size must be > 0");
        }
    }

    if let Some(ref cms) = config.sources.cms {
        if cms.base_url.trim().is_empty() {
            anyhow::bail!("sources.cms.base_url must not be empty");
        }
        if cms.page_size == 0 {
            anyhow::bail!("sources.cms.page_size must be > 0");
        }
    }

    Ok(config)
}
