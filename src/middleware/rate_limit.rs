//! Fixed-window rate limiting per client address.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::ApiError;

const UNKNOWN_PEER: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { reset_after: Duration },
}

/// Counts requests per client in fixed windows
pub struct RateLimiter {
    max: u32,
    window: Duration,
    trust_proxy_hops: usize,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration, trust_proxy_hops: usize) -> Self {
        Self {
            max,
            window,
            trust_proxy_hops,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
            config.trust_proxy_hops,
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request from `client` at `now`.
    pub fn check(&self, client: &str, now: Instant) -> Decision {
        let mut entry = self.windows.entry(client.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                hits: 0,
            };
        }
        entry.hits = entry.hits.saturating_add(1);

        let reset_after = self.window.saturating_sub(now.duration_since(entry.started));
        if entry.hits > self.max {
            Decision::Limited { reset_after }
        } else {
            Decision::Allowed {
                remaining: self.max - entry.hits,
                reset_after,
            }
        }
    }

    /// Drop windows that have expired. Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
        before - self.windows.len()
    }

    /// Address the limit is keyed on.
    ///
    /// The hop chain is the peer followed by `X-Forwarded-For` entries from
    /// right to left; the first `trust_proxy_hops` hops are trusted proxies,
    /// so the client is the next one, or the furthest known when the chain
    /// is shorter.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> String {
        let forwarded: Vec<&str> = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let peer = peer.map(|ip| ip.to_string());
        let mut chain = std::iter::once(peer.as_deref().unwrap_or(UNKNOWN_PEER))
            .chain(forwarded.into_iter().rev())
            .take(self.trust_proxy_hops + 1);

        let mut client = chain.next().unwrap_or(UNKNOWN_PEER);
        for hop in chain {
            client = hop;
        }
        client.to_string()
    }

    fn write_headers(&self, headers: &mut HeaderMap, remaining: u32, reset_after: Duration) {
        let reset_secs = reset_after.as_secs() + u64::from(reset_after.subsec_nanos() > 0);
        headers.insert("ratelimit-limit", HeaderValue::from(self.max));
        headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
        headers.insert("ratelimit-reset", HeaderValue::from(reset_secs));
    }
}

/// Reject requests beyond the per-client limit before they reach a handler.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client = limiter.client_key(req.headers(), peer);

    match limiter.check(&client, Instant::now()) {
        Decision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(req).await;
            limiter.write_headers(response.headers_mut(), remaining, reset_after);
            response
        }
        Decision::Limited { reset_after } => {
            tracing::warn!("Rate limit exceeded for {}", client);
            let mut response = ApiError::TooManyRequests.into_response();
            limiter.write_headers(response.headers_mut(), 0, reset_after);
            let retry_after = reset_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// Periodically forget expired windows so idle clients don't accumulate.
pub fn spawn_pruner(limiter: Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(limiter.window());
        loop {
            ticker.tick().await;
            let removed = limiter.prune(Instant::now());
            if removed > 0 {
                tracing::debug!("Pruned {} expired rate limit windows", removed);
            }
        }
    })
}
