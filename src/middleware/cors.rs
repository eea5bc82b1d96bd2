use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Error, Result};

pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Restricts to one origin when configured, otherwise permissive.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let Some(origin) = allowed_origin else {
        return Ok(permissive_cors());
    };
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| Error::Config(format!("Invalid CORS_ALLOWED_ORIGIN: {}", origin)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
