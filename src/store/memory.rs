//! In-process `CatalogStore` with the same constraints as the relational schema.
//! Backs tests and `CATALOG_STORAGE=memory` runs; data lives as long as the process.

use crate::error::AppError;
use crate::models::{Category, CategoryInput, CategorySummary, Product, ProductFilter, ProductInput, Search};
use crate::pagination::PageWindow;
use crate::store::CatalogStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    next_category_id: i64,
    next_product_id: i64,
}

impl Tables {
    fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> bool {
        let lowered = name.to_lowercase();
        self.categories
            .values()
            .any(|c| Some(c.id) != exclude_id && c.name.to_lowercase() == lowered)
    }

    fn code_taken(&self, code: &str, exclude_id: Option<i64>) -> bool {
        self.products.values().any(|p| Some(p.id) != exclude_id && p.code == code)
    }

    fn products_count(&self, category_id: i64) -> i64 {
        self.products.values().filter(|p| p.category_id == category_id).count() as i64
    }

    /// Categories by lowercased name, then id; matches `lower("name"), "id"` in SQL.
    fn sorted_categories(&self, search: Option<Search<'_>>) -> Vec<&Category> {
        let mut rows: Vec<&Category> = self
            .categories
            .values()
            .filter(|c| search.map(|s| s.fields.matches(*c, s.term)).unwrap_or(true))
            .collect();
        rows.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
        rows
    }

    /// Products newest first, ties broken by higher id.
    fn sorted_products(&self, filter: ProductFilter<'_>) -> Vec<&Product> {
        let mut rows: Vec<&Product> = self
            .products
            .values()
            .filter(|p| filter.category_id.map(|id| p.category_id == id).unwrap_or(true))
            .filter(|p| filter.search.map(|s| s.fields.matches(*p, s.term)).unwrap_or(true))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    fn check_product(&self, input: &ProductInput, exclude_id: Option<i64>) -> Result<(), AppError> {
        if self.code_taken(&input.code, exclude_id) {
            return Err(AppError::Conflict(format!("product code '{}' already exists", input.code)));
        }
        if !self.categories.contains_key(&input.category_id) {
            return Err(AppError::Conflict(format!("category {} does not exist", input.category_id)));
        }
        Ok(())
    }
}

fn slice<T: Clone>(rows: Vec<&T>, window: PageWindow) -> Vec<T> {
    rows.into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .cloned()
        .collect()
}

#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn count_categories(&self, search: Option<Search<'_>>) -> Result<u64, AppError> {
        Ok(self.read().sorted_categories(search).len() as u64)
    }

    async fn list_categories(&self, search: Option<Search<'_>>, window: PageWindow) -> Result<Vec<CategorySummary>, AppError> {
        let tables = self.read();
        let page = slice(tables.sorted_categories(search), window);
        Ok(page
            .into_iter()
            .map(|category| CategorySummary {
                products_count: tables.products_count(category.id),
                category,
            })
            .collect())
    }

    async fn all_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.read().sorted_categories(None).into_iter().cloned().collect())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn category_name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        Ok(self.read().name_taken(name, exclude_id))
    }

    async fn insert_category(&self, input: &CategoryInput) -> Result<Category, AppError> {
        let mut tables = self.write();
        if tables.name_taken(&input.name, None) {
            return Err(AppError::Conflict(format!("category name '{}' already exists", input.name)));
        }
        tables.next_category_id += 1;
        let now = Utc::now();
        let category = Category {
            id: tables.next_category_id,
            name: input.name.clone(),
            description: input.description.clone(),
            image: input.image.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>, AppError> {
        let mut tables = self.write();
        if !tables.categories.contains_key(&id) {
            return Ok(None);
        }
        if tables.name_taken(&input.name, Some(id)) {
            return Err(AppError::Conflict(format!("category name '{}' already exists", input.name)));
        }
        let Some(category) = tables.categories.get_mut(&id) else {
            return Ok(None);
        };
        category.name = input.name.clone();
        category.description = input.description.clone();
        if let Some(image) = &input.image {
            category.image = Some(image.clone());
        }
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        let mut tables = self.write();
        let removed = tables.categories.remove(&id);
        if removed.is_some() {
            tables.products.retain(|_, p| p.category_id != id);
        }
        Ok(removed)
    }

    async fn count_products(&self, filter: ProductFilter<'_>) -> Result<u64, AppError> {
        Ok(self.read().sorted_products(filter).len() as u64)
    }

    async fn list_products(&self, filter: ProductFilter<'_>, window: PageWindow) -> Result<Vec<Product>, AppError> {
        Ok(slice(self.read().sorted_products(filter), window))
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.read().products.get(&id).cloned())
    }

    async fn product_code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        Ok(self.read().code_taken(code, exclude_id))
    }

    async fn insert_product(&self, input: &ProductInput) -> Result<Product, AppError> {
        let mut tables = self.write();
        tables.check_product(input, None)?;
        tables.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: tables.next_product_id,
            name: input.name.clone(),
            price: input.price,
            image: input.image.clone(),
            instock: input.instock,
            code: input.code.clone(),
            description: input.description.clone(),
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Option<Product>, AppError> {
        let mut tables = self.write();
        if !tables.products.contains_key(&id) {
            return Ok(None);
        }
        tables.check_product(input, Some(id))?;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        product.name = input.name.clone();
        product.price = input.price;
        product.instock = input.instock;
        product.code = input.code.clone();
        product.description = input.description.clone();
        product.category_id = input.category_id;
        if let Some(image) = &input.image {
            product.image = Some(image.clone());
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.write().products.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityKind, SearchFields};
    use rust_decimal::Decimal;

    fn category(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.into(),
            description: format!("{} things", name),
            image: None,
        }
    }

    fn product(code: &str, category_id: i64) -> ProductInput {
        ProductInput {
            name: format!("Item {}", code),
            price: Decimal::new(1999, 2),
            instock: 1,
            code: code.into(),
            description: "plain".into(),
            category_id,
            image: None,
        }
    }

    const ALL: PageWindow = PageWindow { offset: 0, limit: 100 };

    #[tokio::test]
    async fn category_names_are_unique_ignoring_case() {
        let store = MemoryCatalogStore::new();
        let shoes = store.insert_category(&category("Shoes")).await.unwrap();
        assert!(store.category_name_exists("SHOES", None).await.unwrap());
        assert!(!store.category_name_exists("shoes", Some(shoes.id)).await.unwrap());
        let err = store.insert_category(&category("shoes")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn categories_list_alphabetically_ignoring_case() {
        let store = MemoryCatalogStore::new();
        for name in ["Zebra", "apple", "Mango"] {
            store.insert_category(&category(name)).await.unwrap();
        }
        let listed: Vec<String> = store
            .list_categories(None, ALL)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.category.name)
            .collect();
        assert_eq!(listed, vec!["apple", "Mango", "Zebra"]);
        let choices: Vec<String> = store.all_categories().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(choices, listed);
    }

    #[tokio::test]
    async fn delete_category_cascades_to_products() {
        let store = MemoryCatalogStore::new();
        let shirts = store.insert_category(&category("Shirts")).await.unwrap();
        let hats = store.insert_category(&category("Hats")).await.unwrap();
        let tee = store.insert_product(&product("TEE", shirts.id)).await.unwrap();
        let cap = store.insert_product(&product("CAP", hats.id)).await.unwrap();

        assert!(store.delete_category(shirts.id).await.unwrap().is_some());
        assert!(store.get_product(tee.id).await.unwrap().is_none());
        assert!(store.get_product(cap.id).await.unwrap().is_some());
        assert!(store.delete_category(shirts.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn products_need_unique_code_and_existing_category() {
        let store = MemoryCatalogStore::new();
        let c = store.insert_category(&category("Shirts")).await.unwrap();
        store.insert_product(&product("A1", c.id)).await.unwrap();
        assert!(store.insert_product(&product("A1", c.id)).await.is_err());
        assert!(store.insert_product(&product("B2", c.id + 10)).await.is_err());
        assert_eq!(store.count_products(ProductFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_rejects_code_held_by_another_product() {
        let store = MemoryCatalogStore::new();
        let c = store.insert_category(&category("Shirts")).await.unwrap();
        store.insert_product(&product("AAA", c.id)).await.unwrap();
        let bbb = store.insert_product(&product("BBB", c.id)).await.unwrap();

        let err = store.update_product(bbb.id, &product("AAA", c.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.get_product(bbb.id).await.unwrap().unwrap().code, "BBB");

        let own = store.update_product(bbb.id, &product("BBB", c.id)).await.unwrap();
        assert!(own.is_some());
        assert!(store.update_product(999, &product("ZZZ", c.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn products_list_newest_first_and_filter_by_category() {
        let store = MemoryCatalogStore::new();
        let a = store.insert_category(&category("A")).await.unwrap();
        let b = store.insert_category(&category("B")).await.unwrap();
        for (code, cat) in [("P1", a.id), ("P2", b.id), ("P3", a.id)] {
            store.insert_product(&product(code, cat)).await.unwrap();
        }
        let all = store.list_products(ProductFilter::default(), ALL).await.unwrap();
        let codes: Vec<&str> = all.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["P3", "P2", "P1"]);

        let in_a = ProductFilter { search: None, category_id: Some(a.id) };
        assert_eq!(store.count_products(in_a).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn category_listing_counts_products_and_searches() {
        let store = MemoryCatalogStore::new();
        let shirts = store.insert_category(&category("Shirts")).await.unwrap();
        store.insert_category(&category("Hats")).await.unwrap();
        store.insert_product(&product("T1", shirts.id)).await.unwrap();

        let fields = SearchFields::all(EntityKind::Category);
        let rows = store.list_categories(Search::new(Some("SHIRT"), &fields), ALL).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].products_count, 1);

        let names: Vec<String> = store.all_categories().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Hats", "Shirts"]);
    }

    #[tokio::test]
    async fn update_keeps_image_unless_replaced() {
        let store = MemoryCatalogStore::new();
        let mut input = category("Shoes");
        input.image = Some("categories/a.png".into());
        let c = store.insert_category(&input).await.unwrap();

        input.image = None;
        input.description = "new".into();
        let updated = store.update_category(c.id, &input).await.unwrap().unwrap();
        assert_eq!(updated.image.as_deref(), Some("categories/a.png"));
        assert!(updated.updated_at >= c.updated_at);
        assert_eq!(updated.created_at, c.created_at);
    }
}
