//! Static informational pages.

use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
struct AboutPage<'a> {
    title: &'static str,
    site_name: &'a str,
    sections: [&'static str; 2],
}

#[derive(Serialize)]
struct ContactPage<'a> {
    title: &'static str,
    site_name: &'a str,
    email: &'a str,
}

/// GET /about/
pub async fn about(State(state): State<AppState>) -> impl IntoResponse {
    success_one_ok(AboutPage {
        title: "About",
        site_name: &state.site.name,
        sections: ["products", "categories"],
    })
    .into_response()
}

/// GET /contact/
pub async fn contact(State(state): State<AppState>) -> impl IntoResponse {
    success_one_ok(ContactPage {
        title: "Contact",
        site_name: &state.site.name,
        email: &state.site.contact_email,
    })
    .into_response()
}
