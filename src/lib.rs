//! # flowdex
//!
//! A corpus pipeline for automation-workflow templates.
//!
//! flowdex ingests template documents from heterogeneous sources (scrape
//! dumps, an authenticated paginated API, a CMS), sanitizes and slugs them,
//! maintains a compact rebuildable index for fast listing, and selects
//! keyword-ranked context chunks used to augment generative-model prompts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────────┐
//! │   Sources    │──▶│   Ingest    │──▶│  Corpus Store  │
//! │ bulk/api/cms │   │ name+slug   │   │ <slug>.json    │
//! └──────────────┘   └─────────────┘   └──────┬────────┘
//!                                             │
//!                    ┌────────────────────────┼──────────────┐
//!                    ▼                        ▼              ▼
//!              ┌──────────┐            ┌──────────┐   ┌───────────┐
//!              │ Reindex  │──────────▶│  Query    │   │  Clean +  │
//!              │index.json│   cache   │  Engine   │   │ Retrieval │
//!              └──────────┘            └──────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fdx init                          # create the corpus layout
//! fdx ingest bulk                   # import a scrape dump
//! fdx reindex                       # build the index artifact
//! fdx query "notion" --category All # search the index
//! fdx clean                         # sanitize for prompt reuse
//! fdx context "sync notion to slack"
//! fdx serve                         # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`sanitize`] | Sensitive-field and webhook-URL redaction |
//! | [`slug`] | Slug derivation and path-safety validation |
//! | [`store`] | One-file-per-document corpus store + index artifact |
//! | [`connector_bulk`] | Local scrape-dump source |
//! | [`connector_api`] | Authenticated paginated API source |
//! | [`connector_cms`] | Authoritative CMS source |
//! | [`ingest`] | Batch ingestion orchestration |
//! | [`index`] | Index builder |
//! | [`query`] | Filtered, paginated query engine |
//! | [`retrieval`] | Top-k keyword retrieval for prompt context |
//! | [`server`] | HTTP API |

pub mod config;
pub mod connector_api;
pub mod connector_bulk;
pub mod connector_cms;
pub mod error;
pub mod get;
pub mod index;
pub mod ingest;
pub mod models;
pub mod query;
pub mod retrieval;
pub mod sanitize;
pub mod server;
pub mod slug;
pub mod sources;
pub mod stats;
pub mod store;
