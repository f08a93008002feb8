//! Service-account authorization for the remote store.
//!
//! Signs an RS256 JWT assertion with the service account key, trades it for
//! an OAuth access token and caches the token until shortly before it
//! expires.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

use super::StoreError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str =
    "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// The parts of a Google service account key the gateway needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccount {
    /// Read a service account key file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service account file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Invalid service account file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let account: ServiceAccount = serde_json::from_str(raw)?;
        Ok(account.normalized())
    }

    /// Build from separate environment values
    pub fn from_parts(client_email: String, private_key: String) -> Self {
        ServiceAccount {
            client_email,
            private_key,
            token_uri: default_token_uri(),
        }
        .normalized()
    }

    /// Keys pasted into env files usually carry literal `\n` sequences.
    fn normalized(mut self) -> Self {
        self.private_key = self.private_key.replace("\\n", "\n");
        self
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Hands out OAuth access tokens for one service account
pub struct AccessTokenSource {
    account: ServiceAccount,
    key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenSource {
    pub fn new(account: ServiceAccount, http: reqwest::Client) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .context("Service account private key is not a valid RSA PEM key")?;
        Ok(Self {
            account,
            key,
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.account.client_email
    }

    /// A valid access token, refreshed when the cached one is about to expire
    pub async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_token(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken, StoreError> {
        let claims = assertion_claims(&self.account, now);
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {}", e)))?;

        let response = self
            .http
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("unexpected token response: {}", e)))?;

        tracing::debug!(
            "Obtained access token for {} (expires in {}s)",
            self.account.client_email,
            token.expires_in
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

fn assertion_claims(account: &ServiceAccount, now: i64) -> AssertionClaims<'_> {
    AssertionClaims {
        iss: &account.client_email,
        scope: SCOPES,
        aud: &account.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    }
}
