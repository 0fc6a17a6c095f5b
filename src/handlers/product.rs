//! Product handlers: list with search, detail, create, update, delete.

use crate::error::AppError;
use crate::extractors::FormSubmission;
use crate::forms::{ProductForm, PRODUCT_FIELDS};
use crate::handlers::{category_choices, FormPage, ListParams};
use crate::models::{Category, Product, ProductFilter, Search};
use crate::pagination::{Paginator, PRODUCTS_PER_PAGE};
use crate::response::{success_one_ok, success_page, Redirect};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;

const MEDIA_AREA: &str = "products";

pub fn detail_path(id: i64) -> String {
    format!("/products/{}/", id)
}

pub const LIST_PATH: &str = "/products/";

#[derive(Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
}

async fn load(state: &AppState, id: i64) -> Result<Product, AppError> {
    state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("product", id))
}

/// GET /products/
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ProductFilter {
        search: Search::new(params.search.as_deref(), &state.product_search),
        category_id: None,
    };
    let total = state.store.count_products(filter).await?;
    let paginator = Paginator::new(total, PRODUCTS_PER_PAGE);
    let number = paginator.resolve(params.page.as_deref());
    let items = state.store.list_products(filter, paginator.window(number)).await?;
    Ok(success_page(paginator.page(number, items), filter.search.map(|s| s.term)))
}

/// GET /products/:id/
pub async fn detail(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, AppError> {
    let product = load(&state, id).await?;
    let category = state.store.get_category(product.category_id).await?;
    Ok(success_one_ok(ProductDetail { product, category }))
}

/// GET /products/create/
pub async fn create_form(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let choices = category_choices(state.store.all_categories().await?);
    Ok(success_one_ok(FormPage::<Product> {
        fields: PRODUCT_FIELDS,
        initial: None,
        choices: Some(choices),
    }))
}

/// POST /products/create/
pub async fn create(State(state): State<AppState>, submission: FormSubmission) -> Result<Redirect, AppError> {
    let cleaned = ProductForm::new(&submission, None).clean(state.store.as_ref()).await?;
    let mut input = cleaned.input;
    if let Some(upload) = &cleaned.upload {
        input.image = Some(state.media.save(MEDIA_AREA, upload).await?);
    }
    let inserted = state.store.insert_product(&input).await;
    let product = state.media.release_on_error(input.image.as_deref(), inserted).await?;
    tracing::info!(id = product.id, code = %product.code, "product created");
    Ok(Redirect::to(
        detail_path(product.id),
        format!("Product \"{}\" created successfully!", product.name),
    ))
}

/// GET /products/:id/update/
pub async fn update_form(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, AppError> {
    let product = load(&state, id).await?;
    let choices = category_choices(state.store.all_categories().await?);
    Ok(success_one_ok(FormPage {
        fields: PRODUCT_FIELDS,
        initial: Some(product),
        choices: Some(choices),
    }))
}

/// POST /products/:id/update/
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    submission: FormSubmission,
) -> Result<Redirect, AppError> {
    let current = load(&state, id).await?;
    let cleaned = ProductForm::new(&submission, Some(&current)).clean(state.store.as_ref()).await?;
    let mut input = cleaned.input;
    if let Some(upload) = &cleaned.upload {
        input.image = Some(state.media.save(MEDIA_AREA, upload).await?);
    }
    let updated = state
        .store
        .update_product(id, &input)
        .await
        .and_then(|row| row.ok_or_else(|| AppError::not_found("product", id)));
    let product = state.media.release_on_error(input.image.as_deref(), updated).await?;
    tracing::info!(id, "product updated");
    Ok(Redirect::to(
        detail_path(product.id),
        format!("Product \"{}\" updated successfully!", product.name),
    ))
}

/// GET /products/:id/delete/: the record to confirm.
pub async fn delete_confirm(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(load(&state, id).await?))
}

/// POST /products/:id/delete/
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect, AppError> {
    let product = state
        .store
        .delete_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("product", id))?;
    tracing::info!(id, "product deleted");
    Ok(Redirect::to(
        LIST_PATH,
        format!("Product \"{}\" deleted successfully!", product.name),
    ))
}
