use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::models::{Collection, CreatePayload, CreatedRecord, FarmerDetail, FarmerSummary, JsonMap};
use crate::store::{RecordStore, StoreError, StorePath};

/// Store path holding farmer records keyed by id
pub const FARMERS_PATH: &str = "userid";
/// Store path holding the pest report tree
pub const PEST_REPORT_PATH: &str = "Pest-report";

/// Shapes store reads and writes into the public record formats
#[derive(Clone)]
pub struct RecordGateway {
    store: Arc<dyn RecordStore>,
}

impl RecordGateway {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Every child of the farmer collection, projected onto the public fields
    pub async fn list_farmers(&self) -> Result<Vec<FarmerSummary>, StoreError> {
        let path = StorePath::parse(FARMERS_PATH)?;
        let farmers = match self.store.read(&path).await? {
            Some(JsonValue::Object(children)) => children
                .iter()
                .map(|(id, record)| FarmerSummary::from_record(id, record))
                .collect(),
            // arrays come back when every key is a small integer
            Some(JsonValue::Array(children)) => children
                .iter()
                .enumerate()
                .filter(|(_, record)| !record.is_null())
                .map(|(index, record)| FarmerSummary::from_record(&index.to_string(), record))
                .collect(),
            _ => Vec::new(),
        };

        tracing::debug!("Listed {} farmers", farmers.len());
        Ok(farmers)
    }

    /// One farmer, or `None` when nothing is stored under `id`
    pub async fn get_farmer(&self, id: &str) -> Result<Option<FarmerDetail>, StoreError> {
        let path = StorePath::parse(FARMERS_PATH)?.child(id)?;
        Ok(self
            .store
            .read(&path)
            .await?
            .map(|record| FarmerDetail::from_record(id, record)))
    }

    /// The raw pest report tree, or an empty object
    pub async fn pest_report(&self) -> Result<JsonValue, StoreError> {
        let path = StorePath::parse(PEST_REPORT_PATH)?;
        Ok(self
            .store
            .read(&path)
            .await?
            .unwrap_or_else(|| JsonValue::Object(JsonMap::new())))
    }

    /// Append a record to `collection`, stamped with a fresh key and the
    /// current time, and return exactly what was stored.
    pub async fn create(
        &self,
        collection: Collection,
        payload: CreatePayload,
    ) -> Result<CreatedRecord, StoreError> {
        let id = self.store.new_key();
        let path = StorePath::parse(collection.path())?.child(&id)?;
        let record = CreatedRecord::new(payload, id, chrono::Utc::now().timestamp_millis());

        self.store.set(&path, &serde_json::to_value(&record)?).await?;

        tracing::info!("Created record {} in {}", record.id, collection.path());
        Ok(record)
    }
}
