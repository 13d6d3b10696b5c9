//! Health check endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::render::PageCacheStats;
use crate::state::AppState;
use crate::store::{DocumentStore, StoreStats};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub store: StoreHealth,
    pub page_cache: PageCacheStats,
    pub views: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub backend: &'static str,
    #[serde(flatten)]
    pub stats: StoreStats,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "docdesk-server",
        store: StoreHealth {
            backend: state.store().backend(),
            stats: state.store().stats(),
        },
        page_cache: state.engine().page_cache().stats(),
        views: state.views().len(),
    })
}
