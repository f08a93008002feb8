use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use tokio::sync::RwLock;

use super::push_id::PushIdGenerator;
use super::{RecordStore, StoreError, StorePath};

/// In-process store holding the whole tree as one JSON value
///
/// Used by tests and for local development without database credentials.
pub struct MemoryStore {
    root: RwLock<JsonValue>,
    push_ids: PushIdGenerator,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(JsonValue::Null)
    }

    /// Start from an existing tree, e.g. a database export
    pub fn with_data(data: JsonValue) -> Self {
        Self {
            root: RwLock::new(normalize(data)),
            push_ids: PushIdGenerator::new(),
        }
    }

    /// Load a JSON export from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read memory store seed {}", path.display()))?;
        let data: JsonValue = serde_json::from_str(&raw)
            .with_context(|| format!("Memory store seed {} is not valid JSON", path.display()))?;
        tracing::info!("Seeded memory store from {}", path.display());
        Ok(Self::with_data(data))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Option<JsonValue>, StoreError> {
        let root = self.root.read().await;
        let mut node = &*root;
        for segment in path.segments() {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(if node.is_null() { None } else { Some(node.clone()) })
    }

    fn new_key(&self) -> String {
        self.push_ids.next_id()
    }

    async fn set(&self, path: &StorePath, value: &JsonValue) -> Result<(), StoreError> {
        let value = normalize(value.clone());
        let mut root = self.root.write().await;

        let Some((last, parents)) = path.segments().split_last() else {
            *root = value;
            return Ok(());
        };

        if value.is_null() {
            remove_at(&mut root, parents, last);
        } else {
            let mut node = &mut *root;
            for segment in parents {
                node = object_entry(node, segment);
            }
            as_object(node).insert(last.clone(), value);
        }

        tracing::debug!("Set value at {}", path);
        Ok(())
    }
}

/// Turn `node` into an object if it isn't one and return the child slot,
/// creating an empty object there when missing.
fn object_entry<'a>(node: &'a mut JsonValue, key: &str) -> &'a mut JsonValue {
    as_object(node)
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()))
}

fn as_object(node: &mut JsonValue) -> &mut Map<String, JsonValue> {
    if !node.is_object() {
        *node = JsonValue::Object(Map::new());
    }
    match node {
        JsonValue::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Remove `parents/last` and prune any parents left empty.
fn remove_at(node: &mut JsonValue, parents: &[String], last: &str) {
    let JsonValue::Object(map) = node else {
        return;
    };
    match parents.split_first() {
        None => {
            map.remove(last);
        }
        Some((head, rest)) => {
            if let Some(child) = map.get_mut(head) {
                remove_at(child, rest, last);
                if child.as_object().is_some_and(|m| m.is_empty()) {
                    map.remove(head);
                }
            }
        }
    }
}

/// Drop nulls and empty objects, the way the remote store never keeps them.
fn normalize(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let cleaned: Map<String, JsonValue> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                JsonValue::Null
            } else {
                JsonValue::Object(cleaned)
            }
        }
        other => other,
    }
}
