//! Integration tests for the nlfilter binary
//!
//! Every test runs against a config path inside a temp dir with provider
//! credentials removed, so nothing reaches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CREDENTIALS: [&str; 5] = [
    "OPENROUTER_API_KEY",
    "OPENAI_API_KEY",
    "PINECONE_API_KEY",
    "PINECONE_INDEX_NAME",
    "NLFILTER_LOCAL_EMBEDDING_URL",
];

fn nlfilter_cmd(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nlfilter").unwrap();
    for key in CREDENTIALS {
        cmd.env_remove(key);
    }
    cmd.env("NLFILTER_CONFIG", temp.path().join("config.yml"));
    cmd
}

#[test]
fn test_filter_author_json() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .args(["filter", "articles", "by", "Jane", "Doe", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""author": "Jane Doe""#))
        .stdout(predicate::str::contains(r#""type": "rule_based""#))
        .stdout(predicate::str::contains(r#""kind": "no_providers""#));
}

#[test]
fn test_filter_offline_conjunction() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .args([
            "filter",
            "--offline",
            "--format",
            "json",
            "posts containing both Rohit Sharma and Shubman Gill",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("$and"))
        .stdout(predicate::str::contains(r#""kind": "offline""#));
}

#[test]
fn test_filter_terminal_output() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .args(["filter", "articles from 2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"publishedTimestamp":{"$gte":1704067200,"$lt":1735689600}}"#,
        ))
        .stdout(predicate::str::contains("rule-based (no providers configured)"));
}

#[test]
fn test_prompt_contains_query() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .args(["prompt", "IPL 2025 articles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Now convert: \"IPL 2025 articles\""))
        .stdout(predicate::str::contains("TODAY:"));
}

#[test]
fn test_schema_lists_fields_and_operators() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .args(["schema", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("publishedTimestamp"))
        .stdout(predicate::str::contains("$nin"))
        .stdout(predicate::str::contains("$and"));
}

#[test]
fn test_search_without_index_key_reports_error() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .args(["search", "--offline", "--format", "json", "articles by Akainu"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""author": "Akainu""#))
        .stdout(predicate::str::contains(r#""error""#))
        .stderr(predicate::str::contains("Pinecone API key"));
}

#[test]
fn test_stats_without_index_key_fails() {
    let temp = TempDir::new().unwrap();

    nlfilter_cmd(&temp)
        .arg("stats")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Pinecone API key"));
}

#[test]
fn test_config_init_show_and_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.yml");

    nlfilter_cmd(&temp)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    nlfilter_cmd(&temp)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    nlfilter_cmd(&temp)
        .env("PINECONE_API_KEY", "pc-secret")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bridged-demo-articles"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("pc-secret").not());

    nlfilter_cmd(&temp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yml"));
}

#[test]
fn test_custom_vocabulary_from_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yml"),
        "vocabulary:\n  authors:\n    - Nico Robin\n",
    )
    .unwrap();

    nlfilter_cmd(&temp)
        .args(["filter", "--format", "json", "essays by Nico Robin"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""author": "Nico Robin""#));
}

#[test]
fn test_invalid_config_exit_code() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yml"),
        "embedding:\n  dimensions: 0\n",
    )
    .unwrap();

    nlfilter_cmd(&temp)
        .args(["filter", "anything"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("dimensions"));
}
