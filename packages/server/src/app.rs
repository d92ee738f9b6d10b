use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use linkhold::{HttpFetcher, PostgresStore};
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared handler state: the store and the outbound fetch client, both
/// built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PostgresStore>,
    pub fetcher: Arc<HttpFetcher>,
}

pub fn build_app(store: PostgresStore, fetcher: HttpFetcher) -> Router {
    let state = AppState {
        store: Arc::new(store),
        fetcher: Arc::new(fetcher),
    };

    Router::new()
        .route("/links", get(routes::list_links))
        .route("/getlinks", get(routes::export_urls))
        .route("/add", post(routes::add_link))
        .route("/batchadd", post(routes::batch_add_links))
        .route("/edit", post(routes::edit_title))
        .route("/link/:key", delete(routes::delete_link))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
