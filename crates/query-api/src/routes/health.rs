//! Liveness endpoints.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
}

/// Service banner.
#[derive(Serialize)]
pub struct Banner {
    pub status: String,
    pub version: String,
}

pub async fn root() -> Json<Banner> {
    Json(Banner {
        status: "API Active".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check endpoint.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}
