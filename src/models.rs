//! Catalog entities: categories and the products that belong to them.

use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// The two persisted record types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    Category,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Category => "category",
        }
    }

    /// Text columns that may take part in a listing search.
    pub fn text_columns(self) -> &'static [&'static str] {
        match self {
            EntityKind::Product => &["name", "description", "code"],
            EntityKind::Category => &["name", "description"],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category row as shown in the listing, with the size of its product set.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct CategorySummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub products_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub instock: i32,
    pub code: String,
    pub description: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cleaned category form data. `image` is set only when a new file was uploaded.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

/// Cleaned product form data. `image` is set only when a new file was uploaded.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub instock: i32,
    pub code: String,
    pub description: String,
    pub category_id: i64,
    pub image: Option<String>,
}

/// Field lookup used by in-process search.
pub trait Searchable {
    fn text_field(&self, name: &str) -> Option<&str>;
}

impl Searchable for Category {
    fn text_field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "description" => Some(&self.description),
            _ => None,
        }
    }
}

impl Searchable for Product {
    fn text_field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "description" => Some(&self.description),
            "code" => Some(&self.code),
            _ => None,
        }
    }
}

/// The set of text columns a listing search matches against (OR-combined).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchFields {
    fields: Vec<&'static str>,
}

impl SearchFields {
    /// Parse a comma-separated field list, checking every name against the entity's text columns.
    pub fn parse(kind: EntityKind, raw: &str) -> Result<Self, ConfigError> {
        let allowed = kind.text_columns();
        let mut fields = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let column = allowed
                .iter()
                .copied()
                .find(|c| *c == name)
                .ok_or_else(|| ConfigError::UnknownSearchField {
                    entity: kind.label(),
                    field: name.to_string(),
                })?;
            if !fields.contains(&column) {
                fields.push(column);
            }
        }
        if fields.is_empty() {
            return Err(ConfigError::Invalid {
                key: "search fields",
                message: format!("at least one field required for {}", kind.label()),
            });
        }
        Ok(SearchFields { fields })
    }

    /// Every text column of the entity.
    pub fn all(kind: EntityKind) -> Self {
        SearchFields {
            fields: kind.text_columns().to_vec(),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fields.clone()
    }

    /// Case-insensitive substring match on any configured field.
    pub fn matches<T: Searchable>(&self, record: &T, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.fields.iter().any(|f| {
            record
                .text_field(f)
                .map(|v| v.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
    }
}

/// A non-empty search term bound to the fields it applies to.
#[derive(Clone, Copy, Debug)]
pub struct Search<'a> {
    pub term: &'a str,
    pub fields: &'a SearchFields,
}

impl<'a> Search<'a> {
    /// `None` when the term is absent or blank, which means "no filtering".
    pub fn new(term: Option<&'a str>, fields: &'a SearchFields) -> Option<Self> {
        term.map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|term| Search { term, fields })
    }
}

/// Filter for product listings: optional search plus an optional owning category.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProductFilter<'a> {
    pub search: Option<Search<'a>>,
    pub category_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(name: &str, description: &str, code: &str) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            name: name.into(),
            price: Decimal::from_str("9.99").unwrap(),
            image: None,
            instock: 3,
            code: code.into(),
            description: description.into(),
            category_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_is_case_insensitive_and_or_combined() {
        let fields = SearchFields::all(EntityKind::Product);
        let p = product("Plain Tee", "A cotton SHIRT", "AB12CD34");
        assert!(fields.matches(&p, "shirt"));
        assert!(fields.matches(&p, "ab12"));
        assert!(!fields.matches(&p, "hoodie"));
    }

    #[test]
    fn search_respects_configured_fields() {
        let fields = SearchFields::parse(EntityKind::Product, "name").unwrap();
        let p = product("Plain Tee", "A cotton shirt", "X1");
        assert!(!fields.matches(&p, "shirt"));
        assert!(fields.matches(&p, "tee"));
    }

    #[test]
    fn parse_rejects_unknown_and_empty() {
        assert!(SearchFields::parse(EntityKind::Category, "code").is_err());
        assert!(SearchFields::parse(EntityKind::Category, " , ").is_err());
        let fields = SearchFields::parse(EntityKind::Category, "name, name,description").unwrap();
        assert_eq!(fields.names(), vec!["name", "description"]);
    }

    #[test]
    fn blank_search_term_means_no_filter() {
        let fields = SearchFields::all(EntityKind::Category);
        assert!(Search::new(None, &fields).is_none());
        assert!(Search::new(Some("   "), &fields).is_none());
        assert_eq!(Search::new(Some(" shirt "), &fields).map(|s| s.term), Some("shirt"));
    }
}
