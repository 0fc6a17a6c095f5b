//! HTTP handlers for products, categories, and the informational pages.

pub mod category;
pub mod pages;
pub mod product;

use crate::forms::FieldSpec;
use crate::models::Category;
use serde::{Deserialize, Serialize};

/// `?search=&page=` on listing and detail routes. `page` stays raw so bad values can fall back.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<String>,
}

/// What a GET on a create/update route returns: the fields to fill and, on update, the current values.
#[derive(Serialize)]
pub struct FormPage<T: Serialize> {
    pub fields: &'static [FieldSpec],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

/// One option of a select field.
#[derive(Serialize)]
pub struct Choice {
    pub value: i64,
    pub label: String,
}

fn category_choices(categories: Vec<Category>) -> Vec<Choice> {
    categories
        .into_iter()
        .map(|c| Choice {
            value: c.id,
            label: c.name,
        })
        .collect()
}
