//! Category handlers. Detail pages carry the category's products, paginated.

use crate::error::AppError;
use crate::extractors::FormSubmission;
use crate::forms::{CategoryForm, CATEGORY_FIELDS};
use crate::handlers::{FormPage, ListParams};
use crate::models::{Category, Product, ProductFilter, Search};
use crate::pagination::{Page, Paginator, CATEGORIES_PER_PAGE, CATEGORY_PRODUCTS_PER_PAGE};
use crate::response::{success_one_ok, success_page, Redirect};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;

const MEDIA_AREA: &str = "categories";

pub const LIST_PATH: &str = "/category/";

pub fn detail_path(id: i64) -> String {
    format!("/category/{}/", id)
}

#[derive(Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub products_count: u64,
    pub products: Page<Product>,
}

async fn load(state: &AppState, id: i64) -> Result<Category, AppError> {
    state
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| AppError::not_found("category", id))
}

/// GET /category/
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let search = Search::new(params.search.as_deref(), &state.category_search);
    let total = state.store.count_categories(search).await?;
    let paginator = Paginator::new(total, CATEGORIES_PER_PAGE);
    let number = paginator.resolve(params.page.as_deref());
    let items = state.store.list_categories(search, paginator.window(number)).await?;
    Ok(success_page(paginator.page(number, items), search.map(|s| s.term)))
}

/// GET /category/:id/. `?page=` walks the category's products.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let category = load(&state, id).await?;
    let filter = ProductFilter {
        search: None,
        category_id: Some(category.id),
    };
    let products_count = state.store.count_products(filter).await?;
    let paginator = Paginator::new(products_count, CATEGORY_PRODUCTS_PER_PAGE);
    let number = paginator.resolve(params.page.as_deref());
    let items = state.store.list_products(filter, paginator.window(number)).await?;
    Ok(success_one_ok(CategoryDetail {
        category,
        products_count,
        products: paginator.page(number, items),
    }))
}

/// GET /category/create/
pub async fn create_form() -> impl IntoResponse {
    success_one_ok(FormPage::<Category> {
        fields: CATEGORY_FIELDS,
        initial: None,
        choices: None,
    })
}

/// POST /category/create/
pub async fn create(State(state): State<AppState>, submission: FormSubmission) -> Result<Redirect, AppError> {
    let cleaned = CategoryForm::new(&submission, None).clean(state.store.as_ref()).await?;
    let mut input = cleaned.input;
    if let Some(upload) = &cleaned.upload {
        input.image = Some(state.media.save(MEDIA_AREA, upload).await?);
    }
    let inserted = state.store.insert_category(&input).await;
    let category = state.media.release_on_error(input.image.as_deref(), inserted).await?;
    tracing::info!(id = category.id, name = %category.name, "category created");
    Ok(Redirect::to(
        detail_path(category.id),
        format!("Category \"{}\" created successfully!", category.name),
    ))
}

/// GET /category/:id/update/
pub async fn update_form(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, AppError> {
    let category = load(&state, id).await?;
    Ok(success_one_ok(FormPage {
        fields: CATEGORY_FIELDS,
        initial: Some(category),
        choices: None,
    }))
}

/// POST /category/:id/update/
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    submission: FormSubmission,
) -> Result<Redirect, AppError> {
    let current = load(&state, id).await?;
    let cleaned = CategoryForm::new(&submission, Some(&current)).clean(state.store.as_ref()).await?;
    let mut input = cleaned.input;
    if let Some(upload) = &cleaned.upload {
        input.image = Some(state.media.save(MEDIA_AREA, upload).await?);
    }
    let updated = state
        .store
        .update_category(id, &input)
        .await
        .and_then(|row| row.ok_or_else(|| AppError::not_found("category", id)));
    let category = state.media.release_on_error(input.image.as_deref(), updated).await?;
    tracing::info!(id, "category updated");
    Ok(Redirect::to(
        detail_path(category.id),
        format!("Category \"{}\" updated successfully!", category.name),
    ))
}

/// GET /category/:id/delete/
pub async fn delete_confirm(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, AppError> {
    let category = load(&state, id).await?;
    let products_count = state
        .store
        .count_products(ProductFilter {
            search: None,
            category_id: Some(id),
        })
        .await?;
    Ok(success_one_ok(serde_json::json!({
        "category": category,
        "products_count": products_count,
    })))
}

/// POST /category/:id/delete/. Removes the category's products too.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Redirect, AppError> {
    let category = state
        .store
        .delete_category(id)
        .await?
        .ok_or_else(|| AppError::not_found("category", id))?;
    tracing::info!(id, "category deleted");
    Ok(Redirect::to(
        LIST_PATH,
        format!("Category \"{}\" deleted successfully!", category.name),
    ))
}
