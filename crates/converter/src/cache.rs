//! Content-addressed cache of normalized documents
//!
//! One pretty-printed JSON file per input, named by the SHA-256 hex digest
//! of the canonicalized input. Reads and writes are best-effort: a missing
//! or corrupt entry is a miss, a failed write is only logged.

use apidoc_mcp_common::Document;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory-backed document cache
#[derive(Debug, Clone)]
pub struct DocumentCache {
    dir: PathBuf,
}

impl DocumentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key for structured input: digest of its sorted-key JSON serialization
    pub fn key_for_value(scope: &str, value: &Value) -> String {
        Self::digest(scope, &canonical_json(value))
    }

    /// Key for unstructured input: digest of the raw text
    pub fn key_for_text(scope: &str, text: &str) -> String {
        Self::digest(scope, text)
    }

    fn digest(scope: &str, canonical: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(scope.as_bytes());
        hasher.update(b"\n");
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Cached document for `key`, if present and readable
    pub fn load(&self, key: &str) -> Option<Document> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Value>(&content)
            .ok()
            .and_then(Document::from_value)
        {
            Some(document) => {
                info!(key, "loaded normalized document from cache");
                Some(document)
            }
            None => {
                warn!(path = %path.display(), "ignoring corrupt cache entry");
                None
            }
        }
    }

    /// Write a document; returns whether the entry was written
    pub fn store(&self, key: &str, document: &Document) -> bool {
        let result = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|_| document.to_pretty_json().map_err(|e| e.to_string()))
            .and_then(|json| fs::write(self.entry_path(key), json).map_err(|e| e.to_string()));

        match result {
            Ok(()) => {
                debug!(key, "cached normalized document");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "failed to write cache entry");
                false
            }
        }
    }
}

/// Compact JSON with object keys sorted at every level
pub fn canonical_json(value: &Value) -> String {
    sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
