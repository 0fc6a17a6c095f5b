//! Catalog routes. Paths keep their trailing slash; GET shows a form or confirmation, POST acts.

use crate::handlers::{category, pages, product};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn product_routes(state: AppState) -> Router {
    Router::new()
        .route("/products/", get(product::list))
        .route("/products/create/", get(product::create_form).post(product::create))
        .route("/products/:id/", get(product::detail))
        .route("/products/:id/update/", get(product::update_form).post(product::update))
        .route("/products/:id/delete/", get(product::delete_confirm).post(product::delete))
        .with_state(state)
}

pub fn category_routes(state: AppState) -> Router {
    Router::new()
        .route("/category/", get(category::list))
        .route("/category/create/", get(category::create_form).post(category::create))
        .route("/category/:id/", get(category::detail))
        .route("/category/:id/update/", get(category::update_form).post(category::update))
        .route("/category/:id/edit/", get(category::update_form).post(category::update))
        .route("/category/:id/delete/", get(category::delete_confirm).post(category::delete))
        .with_state(state)
}

pub fn page_routes(state: AppState) -> Router {
    Router::new()
        .route("/about/", get(pages::about))
        .route("/contact/", get(pages::contact))
        .with_state(state)
}
