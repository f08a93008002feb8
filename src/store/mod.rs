//! Access to the remote path-addressed record store.
//!
//! Every route talks to the store through [`RecordStore`], so handlers can be
//! exercised against [`MemoryStore`] while production uses [`FirebaseStore`].

pub mod credentials;
pub mod firebase;
pub mod memory;
pub mod path;
pub mod push_id;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::config::{Config, StoreBackend};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use path::StorePath;

/// Failure reported by a store operation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid key {key:?}: keys must be non-empty, at most 768 bytes, and can't contain \".\", \"#\", \"$\", \"[\", \"]\", \"/\" or control characters")]
    InvalidKey { key: String },

    #[error("Request to database failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Database responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to authorize database access: {0}")]
    Auth(String),

    #[error("Failed to decode database response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A hierarchical, path-addressed JSON store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point-read the value at `path`. Absent data reads as `None`.
    async fn read(&self, path: &StorePath) -> Result<Option<JsonValue>, StoreError>;

    /// Mint a fresh push key for a child about to be written.
    fn new_key(&self) -> String;

    /// Replace the value at `path`. Writing `null` removes it.
    async fn set(&self, path: &StorePath, value: &JsonValue) -> Result<(), StoreError>;
}

/// Build the store selected by the configuration
pub async fn connect(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Firebase => {
            let store = FirebaseStore::from_config(config)
                .await
                .context("Failed to set up Firebase store")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            let store = match &config.memory_store_seed {
                Some(seed) => MemoryStore::from_file(seed)?,
                None => MemoryStore::new(),
            };
            tracing::warn!("Using in-memory store; records are lost on shutdown");
            Ok(Arc::new(store))
        }
    }
}
