use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window per client address. Requests without connection
/// info share a single window.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    windows: Arc<Mutex<HashMap<Option<IpAddr>, WindowState>>>,
}

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allow(&self, client: Option<IpAddr>, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());
        // Drop idle clients so the map stays bounded.
        if windows.len() > 10_000 {
            windows.retain(|_, w| now.duration_since(w.start) < Duration::from_secs(1));
        }
        let window = windows.entry(client).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= Duration::from_secs(1) {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    if !state.allow(client, Instant::now()) {
        tracing::warn!(client = ?client, path = %req.uri().path(), "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests", "code": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}
