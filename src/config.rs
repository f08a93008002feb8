use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

/// Which `RecordStore` implementation backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firebase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_host: String,
    pub service_port: u16,
    pub store_backend: StoreBackend,
    pub firebase_database_url: Option<String>,
    pub firebase_emulator_host: Option<String>,
    pub firebase_project_id: Option<String>,
    pub firebase_client_email: Option<String>,
    pub firebase_private_key: Option<String>,
    pub google_application_credentials: Option<PathBuf>,
    pub memory_store_seed: Option<PathBuf>,
    pub store_timeout_secs: u64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub trust_proxy_hops: usize,
}

/// Load `config.env` and `.env` into the process environment if present.
/// Variables already set in the environment win.
pub fn load_dotenv() {
    dotenvy::from_filename("config.env").ok();
    dotenvy::dotenv().ok();
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let service_host = var("SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let service_port = var("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number (0-65535)")?;

        let store_backend = match var("STORE_BACKEND").as_deref() {
            None | Some("firebase") => StoreBackend::Firebase,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("STORE_BACKEND must be 'firebase' or 'memory', got '{}'", other),
        };

        let firebase_database_url = var("FIREBASE_DATABASE_URL");
        let firebase_emulator_host = var("FIREBASE_DATABASE_EMULATOR_HOST");
        let firebase_project_id = var("FIREBASE_PROJECT_ID");

        if store_backend == StoreBackend::Firebase {
            if firebase_emulator_host.is_none() && firebase_database_url.is_none() {
                bail!("FIREBASE_DATABASE_URL environment variable is required");
            }
            if firebase_emulator_host.is_some()
                && firebase_database_url.is_none()
                && firebase_project_id.is_none()
            {
                bail!(
                    "FIREBASE_PROJECT_ID or FIREBASE_DATABASE_URL is required to pick the emulator namespace"
                );
            }
        }

        let store_timeout_secs = var("STORE_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .context("STORE_TIMEOUT_SECS must be a whole number of seconds")?;

        let rate_limit_max = var("RATE_LIMIT_MAX")
            .unwrap_or_else(|| "120".to_string())
            .parse::<u32>()
            .context("RATE_LIMIT_MAX must be a positive integer")?;
        if rate_limit_max == 0 {
            bail!("RATE_LIMIT_MAX must be a positive integer");
        }

        let rate_limit_window_secs = var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse::<u64>()
            .context("RATE_LIMIT_WINDOW_SECS must be a whole number of seconds")?;
        if rate_limit_window_secs == 0 {
            bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        let trust_proxy_hops = var("TRUST_PROXY_HOPS")
            .unwrap_or_else(|| "1".to_string())
            .parse::<usize>()
            .context("TRUST_PROXY_HOPS must be a non-negative integer")?;

        Ok(Config {
            service_host,
            service_port,
            store_backend,
            firebase_database_url,
            firebase_emulator_host,
            firebase_project_id,
            firebase_client_email: var("FIREBASE_CLIENT_EMAIL"),
            firebase_private_key: var("FIREBASE_PRIVATE_KEY"),
            google_application_credentials: var("GOOGLE_APPLICATION_CREDENTIALS")
                .map(PathBuf::from),
            memory_store_seed: var("MEMORY_STORE_SEED").map(PathBuf::from),
            store_timeout_secs,
            rate_limit_max,
            rate_limit_window_secs,
            trust_proxy_hops,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Store backend: {:?}", self.store_backend);
        if self.store_backend == StoreBackend::Firebase {
            tracing::info!(
                "  Firebase database: {}",
                self.firebase_database_url.as_deref().unwrap_or("(from project id)")
            );
            tracing::info!(
                "  Firebase emulator: {}",
                self.firebase_emulator_host.as_deref().unwrap_or("disabled (using production)")
            );
            tracing::info!(
                "  Credentials: {}",
                if self.google_application_credentials.is_some() {
                    "service account file"
                } else if self.firebase_client_email.is_some() {
                    "service account from environment"
                } else {
                    "none"
                }
            );
        } else if let Some(seed) = &self.memory_store_seed {
            tracing::info!("  Memory store seed: {}", seed.display());
        }
        tracing::info!(
            "  Rate limit: {} requests per {}s, trusting {} proxy hop(s)",
            self.rate_limit_max,
            self.rate_limit_window_secs,
            self.trust_proxy_hops
        );
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }

    /// Configuration for an in-memory gateway, used by tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            service_host: "127.0.0.1".to_string(),
            service_port: 5000,
            store_backend: StoreBackend::Memory,
            firebase_database_url: None,
            firebase_emulator_host: None,
            firebase_project_id: None,
            firebase_client_email: None,
            firebase_private_key: None,
            google_application_credentials: None,
            memory_store_seed: None,
            store_timeout_secs: 10,
            rate_limit_max: 120,
            rate_limit_window_secs: 60,
            trust_proxy_hops: 1,
        }
    }
}
