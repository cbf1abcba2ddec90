use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{auth::services::bearer_user_id, error::ApiError, state::AppState};

/// Fixed-window counter keyed by an arbitrary string (IP or user id).
/// Process-wide, in-memory; counters reset when the window elapses.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record one request under `key`; false when the window budget is spent.
    pub async fn check(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }
}

/// Best-effort source address: first X-Forwarded-For hop, else a fixed key
/// so direct connections still share one window.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "direct".to_string())
}

/// Auth endpoints: 5 requests per 15 minutes per source IP.
pub async fn auth_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(req.headers());
    if !state.auth_limiter.check(&key).await {
        warn!(%key, "auth rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}

/// Mutating endpoints: 200 requests per 15 minutes per authenticated user,
/// falling back to the source IP. Reads pass through uncounted.
pub async fn api_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if req.method() == Method::GET {
        return Ok(next.run(req).await);
    }
    let key = bearer_user_id(&state, req.headers())
        .map(|id| id.to_string())
        .unwrap_or_else(|| client_key(req.headers()));
    if !state.api_limiter.check(&key).await {
        warn!(%key, "api rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(900));
        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4").await);
        }
        assert!(!limiter.check("1.2.3.4").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(900));
        assert!(limiter.check("a").await);
        assert!(!limiter.check("a").await);
        assert!(limiter.check("b").await);
    }

    #[tokio::test]
    async fn window_elapsing_resets_the_counter() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.check("a").await);
        assert!(!limiter.check("a").await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(limiter.check("a").await);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        assert_eq!(client_key(&headers), "10.0.0.1");
        assert_eq!(client_key(&HeaderMap::new()), "direct");
    }
}
