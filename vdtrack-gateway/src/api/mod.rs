pub mod error;
pub mod ingest;
pub mod models;
pub mod things;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::AppState;
use crate::publish::LocationPublisher;
use crate::registry::ThingRegistry;

pub fn router<R, P>(state: AppState<R, P>, max_body_bytes: usize) -> Router
where
    R: ThingRegistry,
    P: LocationPublisher,
{
    Router::new()
        // Trackers post their raw payloads to the root path
        .route("/", post(ingest::ingest))
        .route("/health", get(health))
        // Ops surface for assignment and enablement
        .route(
            "/things/{device_id}",
            get(things::get_thing).put(things::update_thing),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
