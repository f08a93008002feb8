//! Helpers shared by handler and router tests.

use async_trait::async_trait;
use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::post,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Config;
use crate::state::AppState;
use crate::store::credentials::ServiceAccount;
use crate::store::{MemoryStore, RecordStore, StoreError, StorePath};

pub const TEST_CLIENT_EMAIL: &str = "gateway@agrimitra-test.iam.gserviceaccount.com";
const TEST_PRIVATE_KEY: &str = include_str!("../testdata/service_account_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../testdata/service_account_key.pub.pem");

/// State backed by a memory store seeded with `data`
pub fn test_state(data: JsonValue) -> AppState {
    AppState::new(Arc::new(MemoryStore::with_data(data)), &Config::for_tests())
}

/// State backed by a store that fails every operation
pub fn failing_state() -> AppState {
    AppState::new(Arc::new(FailingStore), &Config::for_tests())
}

pub async fn body_json(response: Response) -> JsonValue {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Store whose reads and writes are always refused
pub struct FailingStore;

pub const FAILING_STORE_MESSAGE: &str = "Permission denied";

#[async_trait]
impl RecordStore for FailingStore {
    async fn read(&self, _path: &StorePath) -> Result<Option<JsonValue>, StoreError> {
        Err(StoreError::Status {
            status: 401,
            message: FAILING_STORE_MESSAGE.to_string(),
        })
    }

    fn new_key(&self) -> String {
        "-FailingStoreKey0000".to_string()
    }

    async fn set(&self, _path: &StorePath, _value: &JsonValue) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: 401,
            message: FAILING_STORE_MESSAGE.to_string(),
        })
    }
}

/// Write `contents` to a fresh file under the system temp directory
pub fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "agrimitra-{}-{}-{}",
        std::process::id(),
        fastrand::u64(..),
        name
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

/// Service account signing with the test key and exchanging at `token_uri`
pub fn test_service_account(token_uri: &str) -> ServiceAccount {
    let mut account =
        ServiceAccount::from_parts(TEST_CLIENT_EMAIL.to_string(), TEST_PRIVATE_KEY.to_string());
    account.token_uri = token_uri.to_string();
    account
}

/// A local OAuth token endpoint that verifies each assertion
pub struct TokenEndpoint {
    pub url: String,
    exchanges: Arc<AtomicUsize>,
}

impl TokenEndpoint {
    /// How many assertions have been exchanged so far
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct TokenEndpointState {
    exchanges: Arc<AtomicUsize>,
    status: StatusCode,
    expires_in: i64,
}

async fn issue_token(
    State(endpoint): State<TokenEndpointState>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<JsonValue>) {
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );

    let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_aud = false;
    let claims = decode::<JsonValue>(&form["assertion"], &key, &validation)
        .unwrap()
        .claims;
    assert_eq!(claims["iss"], TEST_CLIENT_EMAIL);

    let exchange = endpoint.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
    if !endpoint.status.is_success() {
        return (endpoint.status, Json(json!({"error": "invalid_grant"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": format!("test-token-{}", exchange),
            "expires_in": endpoint.expires_in,
            "token_type": "Bearer"
        })),
    )
}

/// Serve a token endpoint answering with `status` and tokens that live
/// `expires_in` seconds
pub async fn spawn_token_endpoint(status: StatusCode, expires_in: i64) -> TokenEndpoint {
    let exchanges = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/token", post(issue_token))
        .with_state(TokenEndpointState {
            exchanges: exchanges.clone(),
            status,
            expires_in,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TokenEndpoint {
        url: format!("http://{}/token", addr),
        exchanges,
    }
}
