use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pplx::storage::SessionStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (SessionStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SessionStore::new(tmp.path().join("sessions"));
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Write a raw session record as `{dir}/{id}.json`
#[allow(dead_code)]
pub fn write_record(dir: &Path, id: &str, record: &Value) -> PathBuf {
    fs::create_dir_all(dir).expect("failed to create sessions dir");
    let path = dir.join(format!("{}.json", id));
    fs::write(&path, serde_json::to_vec_pretty(record).expect("serialize record"))
        .expect("failed to write record");
    path
}

/// A record as written before short ids existed: no `version`, no `shortId`
#[allow(dead_code)]
pub fn legacy_record(id: &str, created_at: &str, initial_query: &str) -> Value {
    json!({
        "id": id,
        "messages": [
            { "role": "user", "content": initial_query, "timestamp": created_at },
            { "role": "assistant", "content": "Answer [1]", "timestamp": created_at }
        ],
        "metadata": {
            "model": "sonar",
            "initial_query": initial_query,
            "created_at": created_at,
            "updated_at": created_at
        }
    })
}

/// A chat completion body as returned by the API
#[allow(dead_code)]
pub fn completion_body(content: &str, results: &[(&str, &str)]) -> Value {
    json!({
        "id": "resp-1",
        "model": "sonar",
        "created": 1705312245,
        "object": "chat.completion",
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 },
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": { "role": "assistant", "content": content }
        }],
        "search_results": results
            .iter()
            .map(|(title, url)| json!({ "title": title, "url": url }))
            .collect::<Vec<_>>()
    })
}
