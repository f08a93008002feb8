use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub type JsonMap = Map<String, JsonValue>;

/// Public view of a farmer, every field present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FarmerSummary {
    pub id: String,
    pub name: String,
    pub citylabel: String,
    pub state: String,
    pub phone: String,
    pub email: String,
}

impl FarmerSummary {
    /// Project a raw `userid/{id}` record onto the public fields.
    ///
    /// Strings pass through, non-zero numbers render as decimals, everything
    /// else (absent, null, zero, booleans, arrays, objects) becomes `""`. A
    /// record that isn't an object has no fields at all.
    pub fn from_record(id: &str, record: &JsonValue) -> Self {
        let field = |name: &str| record.get(name).map(field_text).unwrap_or_default();

        Self {
            id: id.to_string(),
            name: field("name"),
            citylabel: field("citylabel"),
            state: field("state"),
            phone: field("phone"),
            email: field("email"),
        }
    }
}

fn field_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        JsonValue::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// A single farmer: the public fields, defaulted like [`FarmerSummary`],
/// followed by any other stored fields verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmerDetail {
    #[serde(flatten)]
    pub summary: FarmerSummary,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl FarmerDetail {
    /// Merge a stored record under `id`. The requested id always wins over
    /// an `id` field inside the record.
    pub fn from_record(id: &str, record: JsonValue) -> Self {
        let summary = FarmerSummary::from_record(id, &record);
        let mut extra = match record {
            JsonValue::Object(map) => map,
            _ => JsonMap::new(),
        };
        extra.retain(|key, _| !SUMMARY_FIELDS.contains(&key.as_str()));

        Self { summary, extra }
    }
}

const SUMMARY_FIELDS: [&str; 6] = ["id", "name", "citylabel", "state", "phone", "email"];

/// Collections that accept new records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Alerts,
    Schemes,
    Reports,
}

impl Collection {
    /// Store path the collection's records live under
    pub fn path(self) -> &'static str {
        match self {
            Collection::Alerts => "alerts",
            Collection::Schemes => "schemes",
            Collection::Reports => "reports",
        }
    }
}

/// Client-supplied body of a create request, stored as-is
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct CreatePayload(pub JsonMap);

impl CreatePayload {
    /// Parse a request body. An empty body is an empty record; anything else
    /// must be a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}

/// A record as written to the store and returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRecord {
    #[serde(flatten)]
    pub fields: JsonMap,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    pub id: String,
}

impl CreatedRecord {
    /// Stamp a payload with its key and creation time. Body fields named
    /// `createdAt` or `id` are replaced by the derived values.
    pub fn new(payload: CreatePayload, id: String, created_at: i64) -> Self {
        let mut fields = payload.0;
        fields.retain(|key, _| key != "createdAt" && key != "id");

        Self {
            fields,
            created_at,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_farmer_summary_defaults_missing_fields() {
        let summary = FarmerSummary::from_record("abc123", &json!({"name": "Asha"}));

        assert_eq!(
            summary,
            FarmerSummary {
                id: "abc123".to_string(),
                name: "Asha".to_string(),
                citylabel: String::new(),
                state: String::new(),
                phone: String::new(),
                email: String::new(),
            }
        );
    }

    #[test]
    fn test_farmer_summary_field_coercion() {
        let summary = FarmerSummary::from_record(
            "f1",
            &json!({
                "name": "Ravi",
                "citylabel": null,
                "state": false,
                "phone": 9876543210u64,
                "email": {"primary": "ravi@example.com"},
                "landAcres": 4
            }),
        );

        assert_eq!(summary.name, "Ravi");
        assert_eq!(summary.citylabel, "");
        assert_eq!(summary.state, "");
        assert_eq!(summary.phone, "9876543210");
        assert_eq!(summary.email, "");
    }

    #[test]
    fn test_farmer_summary_zero_is_empty() {
        let summary = FarmerSummary::from_record(
            "f3",
            &json!({"name": "Meena", "phone": 0, "citylabel": 0.0, "state": -7}),
        );

        assert_eq!(summary.phone, "");
        assert_eq!(summary.citylabel, "");
        assert_eq!(summary.state, "-7");
    }

    #[test]
    fn test_farmer_summary_from_non_object() {
        let summary = FarmerSummary::from_record("f2", &json!("just a string"));
        assert_eq!(summary.id, "f2");
        assert_eq!(summary.name, "");
    }

    #[test]
    fn test_farmer_summary_serializes_all_fields() {
        let value = serde_json::to_value(FarmerSummary::from_record("f3", &json!({}))).unwrap();
        assert_eq!(
            value,
            json!({"id": "f3", "name": "", "citylabel": "", "state": "", "phone": "", "email": ""})
        );
    }

    #[test]
    fn test_farmer_detail_defaults_and_pins_id() {
        let detail = FarmerDetail::from_record("abc123", json!({"id": "other", "name": "Asha"}));

        assert_eq!(
            serde_json::to_string(&detail).unwrap(),
            r#"{"id":"abc123","name":"Asha","citylabel":"","state":"","phone":"","email":""}"#
        );
    }

    #[test]
    fn test_farmer_detail_keeps_extra_fields() {
        let detail = FarmerDetail::from_record(
            "f-77",
            json!({"crops": ["onion"], "name": "Ravi", "land": {"acres": 4.5}}),
        );
        let value = serde_json::to_value(&detail).unwrap();

        assert_eq!(value["name"], "Ravi");
        assert_eq!(value["email"], "");
        assert_eq!(value["crops"], json!(["onion"]));
        assert_eq!(value["land"], json!({"acres": 4.5}));
    }

    #[test]
    fn test_farmer_detail_from_scalar() {
        let detail = FarmerDetail::from_record("abc123", json!(42));
        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            json!({"id": "abc123", "name": "", "citylabel": "", "state": "", "phone": "", "email": ""})
        );
    }

    #[test]
    fn test_create_payload_parsing() {
        assert_eq!(CreatePayload::from_slice(b"").unwrap(), CreatePayload::default());
        assert_eq!(CreatePayload::from_slice(b"  \n").unwrap(), CreatePayload::default());

        let payload = CreatePayload::from_slice(br#"{"message":"locust sighting"}"#).unwrap();
        assert_eq!(payload.0.get("message"), Some(&json!("locust sighting")));

        assert!(CreatePayload::from_slice(b"[1,2]").is_err());
        assert!(CreatePayload::from_slice(b"\"text\"").is_err());
        assert!(CreatePayload::from_slice(b"{broken").is_err());
    }

    #[test]
    fn test_created_record_layout() {
        let payload = CreatePayload::from_slice(
            br#"{"message":"locust sighting","id":"client-id","createdAt":0,"severity":3}"#,
        )
        .unwrap();
        let record = CreatedRecord::new(payload, "-NxR3c_aZ9kq1Lb2Mv0T".to_string(), 1_700_000_000_000);

        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"message":"locust sighting","severity":3,"createdAt":1700000000000,"id":"-NxR3c_aZ9kq1Lb2Mv0T"}"#
        );
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(Collection::Alerts.path(), "alerts");
        assert_eq!(Collection::Schemes.path(), "schemes");
        assert_eq!(Collection::Reports.path(), "reports");
    }
}
