use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::api::handlers::{self, AppState};

/// Assemble the application router.
///
/// `base_path` is the externally configured `/{path}/{version}` prefix. The
/// model routes live under it; the health probe stays at the top level. The
/// permissive CORS layer answers preflight requests with 200 before they
/// reach any handler.
pub fn create_router(base_path: &str) -> Router<AppState> {
    let api = Router::new()
        .route("/", get(handlers::api_root))
        .route(
            "/:model",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/:model/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(base_path, api)
        .layer(CorsLayer::permissive())
}
