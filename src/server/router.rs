//! Router construction

use crate::server::handlers::{
    AppState, create_resource, get_related, get_relationship, get_resource, health_check,
    list_resources,
};
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Build the JSON:API routes (not yet nested under the base path)
pub fn build_resource_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/{entity_type}/{bundle}",
            get(list_resources).post(create_resource),
        )
        .route("/{entity_type}/{bundle}/{uuid}", get(get_resource))
        .route("/{entity_type}/{bundle}/{uuid}/{field}", get(get_related))
        .route(
            "/{entity_type}/{bundle}/{uuid}/relationships/{field}",
            get(get_relationship),
        )
        .with_state(state)
}

/// Build the complete application router
///
/// Resource routes are mounted under the configured base path; `/health`
/// stays at the root.
pub fn build_router(state: AppState, custom_routes: Vec<Router>) -> Router {
    let base_path = state.config.base_path.trim_end_matches('/').to_string();
    let resources = build_resource_routes(state);

    let mut app = Router::new().route("/health", get(health_check));

    app = if base_path.is_empty() {
        app.merge(resources)
    } else {
        app.nest(&base_path, resources)
    };

    for custom_router in custom_routes {
        app = app.merge(custom_router);
    }

    app.layer(TraceLayer::new_for_http())
}
