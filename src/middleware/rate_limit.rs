use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

const WINDOW: Duration = Duration::from_secs(60);
// Dead windows are swept once the map grows past this.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct WindowState {
    reset_at: Instant,
    count: u32,
}

/// Fixed-window counter keyed by client identity. One instance per
/// route group, injected as middleware state.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limit: u32,
    clients: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Ok(()) if the request fits in the caller's current window,
    /// otherwise Err(seconds until the window resets).
    fn allow(&self, key: &str) -> Result<(), u64> {
        let mut guard = self.clients.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();

        if guard.len() > PRUNE_THRESHOLD {
            guard.retain(|_, w| w.reset_at > now);
        }

        let window = guard.entry(key.to_string()).or_insert(WindowState {
            reset_at: now + WINDOW,
            count: 0,
        });
        if now >= window.reset_at {
            window.reset_at = now + WINDOW;
            window.count = 0;
        }
        if window.count < self.limit {
            window.count += 1;
            Ok(())
        } else {
            Err(window.reset_at.duration_since(now).as_secs().max(1))
        }
    }
}

fn client_key(req: &Request<Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match state.allow(&client_key(&req)) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "ok": false,
                "error": {
                    "message": "Rate limit exceeded. Please try again later.",
                    "retryAfter": retry_after,
                }
            })),
        )
            .into_response(),
    }
}

pub fn new_rpm_state(limit: u32) -> RateLimiter {
    RateLimiter::new(limit)
}
