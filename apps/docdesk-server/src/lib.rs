//! DocDesk Server Library
//!
//! Views over requested documents: find which lifecycle collection holds a
//! document, fetch and decode it, paginate it for display, and offer
//! download and delete. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `store`: backing collection adapters (memory, sqlite, S3)
//! - `lookup`: collection resolution and point fetches
//! - `document`: records, ids and base64 content decoding
//! - `render`: pagination engine (lopdf)
//! - `view`: per-viewer document views and lifecycle actions
//! - `routes`: HTTP API

pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod render;
pub mod routes;
pub mod state;
pub mod store;
pub mod view;

#[cfg(test)]
mod testing;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let home = state.config().view.home_route.clone();
    let mut router = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/health", get(routes::health::health_check))
        .nest(routes::documents::BASE_PATH, routes::documents::router());

    // The home route doubles as a status page unless it is taken
    let taken = ["/health", "/api/v1/health"];
    if !taken.contains(&home.as_str()) && !home.starts_with(routes::documents::BASE_PATH) {
        router = router.route(&home, get(routes::health::health_check));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
