use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fdx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("fdx");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Scrape dump with three usable templates and one unnamed record.
    let dumps_dir = root.join("dumps");
    fs::create_dir_all(&dumps_dir).unwrap();
    fs::write(
        dumps_dir.join("scrape.json"),
        r#"{
  "templates": [
    {
      "id": "t-1",
      "name": "Auto-Sync Notion to Slack!!",
      "description": "Posts new Notion rows   into a Slack channel.",
      "category": "Productivity",
      "usedApps": ["notion", "slack"],
      "usage": 1500,
      "webhookId": "whk_12345",
      "workflow": {
        "nodes": [
          { "type": "http", "url": "https://hooks.slack.com/services/T0/B0/secret" }
        ]
      }
    },
    {
      "id": "t-2",
      "name": "Daily Sales Report",
      "description": "Emails a digest of closed deals.",
      "category": "Sales",
      "usedApps": ["hubspot", "gmail"],
      "price": 10,
      "usage": 300
    },
    {
      "id": "t-3",
      "name": "Invoice Archiver",
      "category": "Finance",
      "usage": 12
    },
    {
      "id": "t-4",
      "description": "No name on this one."
    }
  ]
}"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[corpus]
dir = "{root}/data/corpus"
cleaned_dir = "{root}/data/cleaned"

[query]
default_page_size = 20

[server]
bind = "127.0.0.1:7410"

[sources.bulk]
path = "{root}/dumps"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("fdx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_fdx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = fdx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run fdx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_layout() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_fdx(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/corpus").is_dir());
    assert!(tmp.path().join("data/cleaned").is_dir());

    // Idempotent.
    let (_, _, success2) = run_fdx(&config_path, &["init"]);
    assert!(success2, "second init failed (not idempotent)");
}

#[test]
fn test_ingest_bulk_writes_and_skips() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_fdx(&config_path, &["ingest", "bulk"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("written: 3 documents"));
    assert!(stdout.contains("skipped (no name): 1"));
    assert!(stdout.contains("ok"));

    assert!(tmp
        .path()
        .join("data/corpus/auto-sync-notion-to-slack.json")
        .is_file());
}

#[test]
fn test_reingest_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    let (stdout, _, success) = run_fdx(&config_path, &["ingest", "bulk"]);
    assert!(success);
    assert!(stdout.contains("written: 0 documents"));
    assert!(stdout.contains("unchanged: 3"));
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_fdx(&config_path, &["ingest", "bulk", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("would write: 3 documents"));
    assert!(!tmp
        .path()
        .join("data/corpus/daily-sales-report.json")
        .exists());
}

#[test]
fn test_reindex_reports_counts() {
    let (_tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    let (stdout, stderr, success) = run_fdx(&config_path, &["reindex"]);
    assert!(success, "reindex failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("index records: 3"));
    assert!(stdout.contains("skipped (malformed): 0"));
}

#[test]
fn test_query_before_reindex_is_empty() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_fdx(&config_path, &["query", "anything"]);
    assert!(success, "query must not fail when no index exists");
    assert!(stdout.contains("No results."));
    assert!(stdout.contains("total matches: 0"));
}

#[test]
fn test_query_filters_and_paginates() {
    let (_tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    run_fdx(&config_path, &["reindex"]);

    let (stdout, _, success) = run_fdx(&config_path, &["query", "notion"]);
    assert!(success);
    assert!(stdout.contains("Auto-Sync Notion to Slack!!"));
    assert!(stdout.contains("(1 matches)"));

    let (stdout, _, _) = run_fdx(&config_path, &["query", "--category", "Sales"]);
    assert!(stdout.contains("Daily Sales Report"));
    assert!(!stdout.contains("Invoice Archiver"));

    let (stdout, _, _) = run_fdx(&config_path, &["query", "--complexity", "Advanced"]);
    assert!(stdout.contains("Auto-Sync Notion to Slack!!"));
    assert!(stdout.contains("(1 matches)"));

    let (stdout, _, _) = run_fdx(&config_path, &["query", "--page", "9"]);
    assert!(stdout.contains("No results."));
    assert!(stdout.contains("total matches: 3"));
}

#[test]
fn test_get_and_export() {
    let (tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);

    let (stdout, _, success) = run_fdx(&config_path, &["get", "daily-sales-report"]);
    assert!(success);
    assert!(stdout.contains("Daily Sales Report"));
    assert!(stdout.contains("Intermediate"));

    let out_path = tmp.path().join("export/daily.json");
    let (_, _, success) = run_fdx(
        &config_path,
        &[
            "export",
            "daily-sales-report",
            "--output",
            out_path.to_str().unwrap(),
        ],
    );
    assert!(success);
    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(exported["name"], "Daily Sales Report");
}

#[test]
fn test_get_missing_slug_fails_cleanly() {
    let (_tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    let (_, stderr, success) = run_fdx(&config_path, &["get", "no-such-template"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_export_rejects_traversal_slug() {
    let (_tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    let (_, stderr, success) = run_fdx(&config_path, &["export", "../escape"]);
    assert!(!success);
    assert!(stderr.contains("invalid identifier"));
}

#[test]
fn test_clean_redacts_and_context_selects() {
    let (tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    let (stdout, _, success) = run_fdx(&config_path, &["clean"]);
    assert!(success);
    assert!(stdout.contains("cleaned copies: 3"));

    let cleaned = fs::read_to_string(
        tmp.path()
            .join("data/cleaned/auto-sync-notion-to-slack.json"),
    )
    .unwrap();
    assert!(cleaned.contains("{{WEBHOOKID}}"));
    assert!(!cleaned.contains("whk_12345"));
    assert!(!cleaned.contains("hooks.slack.com"));

    let (stdout, _, success) = run_fdx(&config_path, &["context", "sync notion to slack"]);
    assert!(success);
    assert!(stdout.contains("### Template: auto-sync-notion-to-slack"));
    assert!(stdout.contains("selected 3 chunks"));
}

#[test]
fn test_context_without_cleaned_corpus_is_empty() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_fdx(&config_path, &["context", "anything"]);
    assert!(success, "context must not fail when no cleaned corpus exists");
    assert!(stdout.contains("No context available."));
}

#[test]
fn test_stats_overview() {
    let (_tmp, config_path) = setup_test_env();

    run_fdx(&config_path, &["ingest", "bulk"]);
    run_fdx(&config_path, &["reindex"]);

    let (stdout, _, success) = run_fdx(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:   3"));
    assert!(stdout.contains("3 records"));
}

#[test]
fn test_unknown_source_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_fdx(&config_path, &["ingest", "ftp"]);
    assert!(!success);
    assert!(stderr.contains("Unknown source"));
}
