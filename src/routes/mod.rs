pub mod catalog;
pub mod common;

pub use catalog::{category_routes, page_routes, product_routes};
pub use common::common_routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

/// The whole application: catalog, pages, probes, and uploaded media under `/media`.
/// Request bodies (uploads included) are capped at `max_upload_bytes`.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    let media = ServeDir::new(state.media.root().to_path_buf());
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(product_routes(state.clone()))
        .merge(category_routes(state.clone()))
        .merge(page_routes(state))
        .nest_service("/media", media)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_upload_bytes)),
        )
}
