use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::credentials::{AccessTokenSource, ServiceAccount};
use super::push_id::PushIdGenerator;
use super::{RecordStore, StoreError, StorePath};
use crate::config::Config;

/// Client for the Firebase Realtime Database REST interface
///
/// Each path maps to `{base_url}/{path}.json`. Against the emulator the
/// namespace travels as the `ns` query parameter and no credentials are sent.
#[derive(Clone)]
pub struct FirebaseStore {
    http: reqwest::Client,
    base_url: String,
    namespace: Option<String>,
    tokens: Option<Arc<AccessTokenSource>>,
    push_ids: Arc<PushIdGenerator>,
}

/// Error body returned by the REST interface
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl FirebaseStore {
    /// Create a client from configuration
    ///
    /// With `FIREBASE_DATABASE_EMULATOR_HOST` set the client talks plain HTTP
    /// to the emulator; otherwise it needs service account credentials.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        if let Some(host) = &config.firebase_emulator_host {
            let namespace = emulator_namespace(config)?;
            tracing::info!(
                "Connecting to Firebase emulator at: {} (namespace {})",
                host,
                namespace
            );
            return Ok(Self::emulator(http, host, &namespace));
        }

        let database_url = config
            .firebase_database_url
            .as_deref()
            .context("FIREBASE_DATABASE_URL environment variable is required")?;

        let account = match (
            &config.google_application_credentials,
            &config.firebase_client_email,
            &config.firebase_private_key,
        ) {
            (Some(path), _, _) => ServiceAccount::from_file(path)?,
            (None, Some(email), Some(key)) => ServiceAccount::from_parts(email.clone(), key.clone()),
            _ => bail!(
                "Service account credentials are required: set GOOGLE_APPLICATION_CREDENTIALS \
                 or FIREBASE_CLIENT_EMAIL and FIREBASE_PRIVATE_KEY"
            ),
        };

        let tokens = AccessTokenSource::new(account, http.clone())?;
        tracing::info!(
            "Connecting to Firebase database {} as {}",
            database_url,
            tokens.client_email()
        );

        Ok(Self {
            http,
            base_url: database_url.trim_end_matches('/').to_string(),
            namespace: None,
            tokens: Some(Arc::new(tokens)),
            push_ids: Arc::new(PushIdGenerator::new()),
        })
    }

    /// Unauthenticated client for a local emulator at `host` (`host:port`)
    pub fn emulator(http: reqwest::Client, host: &str, namespace: &str) -> Self {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };

        Self {
            http,
            base_url,
            namespace: Some(namespace.to_string()),
            tokens: None,
            push_ids: Arc::new(PushIdGenerator::new()),
        }
    }

    fn url(&self, path: &StorePath) -> String {
        let encoded: Vec<String> = path
            .segments()
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}.json", self.base_url, encoded.join("/"))
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &StorePath,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(namespace) = &self.namespace {
            request = request.query(&[("ns", namespace)]);
        }
        if let Some(tokens) = &self.tokens {
            request = request.bearer_auth(tokens.access_token().await?);
        }
        Ok(request)
    }
}

#[async_trait]
impl RecordStore for FirebaseStore {
    async fn read(&self, path: &StorePath) -> Result<Option<JsonValue>, StoreError> {
        let response = self.request(reqwest::Method::GET, path).await?.send().await?;
        let value = check_response(response).await?;

        tracing::debug!("Read {} (present: {})", path, !value.is_null());
        Ok(if value.is_null() { None } else { Some(value) })
    }

    fn new_key(&self) -> String {
        self.push_ids.next_id()
    }

    async fn set(&self, path: &StorePath, value: &JsonValue) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .await?
            .query(&[("print", "silent")])
            .json(value)
            .send()
            .await?;
        check_response(response).await?;

        tracing::debug!("Wrote {}", path);
        Ok(())
    }
}

/// Decode a successful body, or turn a failure into `StoreError::Status`
async fn check_response(response: reqwest::Response) -> Result<JsonValue, StoreError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body.trim().to_string()
                }
            });
        tracing::warn!("Database request failed with {}: {}", status, message);
        return Err(StoreError::Status {
            status: status.as_u16(),
            message,
        });
    }

    // `print=silent` writes answer 204 with no body
    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Namespace for the emulator: the database name from the URL, else
/// `{project}-default-rtdb`.
fn emulator_namespace(config: &Config) -> Result<String> {
    if let Some(url) = &config.firebase_database_url {
        let host = url
            .split("://")
            .nth(1)
            .unwrap_or(url.as_str())
            .split(['/', ':', '?'])
            .next()
            .unwrap_or_default();
        if let Some(name) = host.split('.').next().filter(|n| !n.is_empty()) {
            return Ok(name.to_string());
        }
    }
    match &config.firebase_project_id {
        Some(project) => Ok(format!("{}-default-rtdb", project)),
        None => bail!("Cannot determine emulator namespace without FIREBASE_PROJECT_ID"),
    }
}
