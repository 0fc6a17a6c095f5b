//! Shared application state for all routes.

use crate::media::MediaStore;
use crate::models::SearchFields;
use crate::settings::{Settings, SiteInfo};
use crate::store::CatalogStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub media: MediaStore,
    pub product_search: Arc<SearchFields>,
    pub category_search: Arc<SearchFields>,
    pub site: Arc<SiteInfo>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, settings: &Settings) -> Self {
        AppState {
            store,
            media: MediaStore::new(settings.media_root.clone()),
            product_search: Arc::new(settings.product_search.clone()),
            category_search: Arc::new(settings.category_search.clone()),
            site: Arc::new(settings.site.clone()),
        }
    }
}
