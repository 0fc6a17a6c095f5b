//! Standard response envelope helpers.

use crate::pagination::{Page, PageMeta};
use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// One page of a listing with its pagination metadata.
#[derive(Serialize)]
pub struct SuccessPage<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

#[derive(Serialize)]
pub struct ListMeta {
    #[serde(flatten)]
    pub page: PageMeta,
    /// Echo of the search term; empty when not searching.
    pub search_query: String,
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, meta: None }))
}

pub fn success_page<T: Serialize>(page: Page<T>, search_query: Option<&str>) -> (StatusCode, Json<SuccessPage<T>>) {
    (
        StatusCode::OK,
        Json(SuccessPage {
            data: page.items,
            meta: ListMeta {
                page: page.meta,
                search_query: search_query.unwrap_or("").to_string(),
            },
        }),
    )
}

/// Flash notification carried by a redirect.
#[derive(Debug, Serialize)]
pub struct Notice {
    pub message: String,
    pub redirect: String,
}

/// `303 See Other` to `location`, with the notification in the body.
#[derive(Debug)]
pub struct Redirect(pub Notice);

impl Redirect {
    pub fn to(location: impl Into<String>, message: impl Into<String>) -> Self {
        Redirect(Notice {
            message: message.into(),
            redirect: location.into(),
        })
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let location = self.0.redirect.clone();
        (
            StatusCode::SEE_OTHER,
            [(LOCATION, location)],
            Json(SuccessOne { data: self.0, meta: None }),
        )
            .into_response()
    }
}
