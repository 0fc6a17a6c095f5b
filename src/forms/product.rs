use crate::error::{AppError, FormErrors};
use crate::extractors::{FormSubmission, IMAGE_FIELD};
use crate::forms::{image_upload, required_text, Cleaned, FieldSpec, Widget};
use crate::models::{Product, ProductInput};
use crate::store::CatalogStore;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

pub const PRODUCT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Product Name",
        widget: Widget::Text,
        required: true,
        max_length: Some(200),
        help_text: "",
    },
    FieldSpec {
        name: "price",
        label: "Price",
        widget: Widget::Number,
        required: true,
        max_length: None,
        help_text: "Up to 8 digits before and 2 after the decimal point",
    },
    FieldSpec {
        name: "instock",
        label: "Items in Stock",
        widget: Widget::Number,
        required: true,
        max_length: None,
        help_text: "",
    },
    FieldSpec {
        name: "code",
        label: "Product Code",
        widget: Widget::Text,
        required: false,
        max_length: Some(50),
        help_text: "Leave blank to generate one",
    },
    FieldSpec {
        name: "description",
        label: "Description",
        widget: Widget::Textarea,
        required: true,
        max_length: None,
        help_text: "",
    },
    FieldSpec {
        name: "category",
        label: "Category",
        widget: Widget::Select,
        required: true,
        max_length: None,
        help_text: "",
    },
    FieldSpec {
        name: IMAGE_FIELD,
        label: "Product Image",
        widget: Widget::File,
        required: false,
        max_length: None,
        help_text: "",
    },
];

pub const DUPLICATE_CODE: &str = "Product with this Product Code already exists.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const MAX_DIGITS: u32 = 10;
const DECIMAL_PLACES: u32 = 2;
const CODE_ATTEMPTS: usize = 5;

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern"))
}

/// Eight uppercase hex characters from a fresh v4 UUID.
pub fn generate_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Product create/update form. `instance` is the record being edited, if any.
pub struct ProductForm<'a> {
    submission: &'a FormSubmission,
    instance: Option<&'a Product>,
}

impl<'a> ProductForm<'a> {
    pub fn new(submission: &'a FormSubmission, instance: Option<&'a Product>) -> Self {
        ProductForm { submission, instance }
    }

    pub async fn clean(&self, store: &dyn CatalogStore) -> Result<Cleaned<ProductInput>, AppError> {
        let mut errors = FormErrors::new();
        let name = required_text(self.submission, &PRODUCT_FIELDS[0], &mut errors);
        let price = self.clean_price(&mut errors);
        let instock = self.clean_instock(&mut errors);
        let code = self.clean_code(store, &mut errors).await?;
        let description = required_text(self.submission, &PRODUCT_FIELDS[4], &mut errors);
        let category_id = self.clean_category(store, &mut errors).await?;
        let upload = image_upload(self.submission, IMAGE_FIELD, &mut errors);

        match (name, price, instock, code, description, category_id) {
            (Some(name), Some(price), Some(instock), Some(code), Some(description), Some(category_id))
                if errors.is_empty() =>
            {
                Ok(Cleaned {
                    input: ProductInput {
                        name,
                        price,
                        instock,
                        code,
                        description,
                        category_id,
                        image: None,
                    },
                    upload,
                })
            }
            _ => {
                tracing::warn!(errors = errors.len(), "product form rejected");
                Err(AppError::form(errors, self.submission.fields.clone()))
            }
        }
    }

    fn clean_price(&self, errors: &mut FormErrors) -> Option<Decimal> {
        let Some(raw) = self.submission.value("price") else {
            errors.add_required("price");
            return None;
        };
        let Ok(value) = Decimal::from_str(raw) else {
            errors.add("price", "Enter a number.");
            return None;
        };
        if value.is_sign_negative() && !value.is_zero() {
            errors.add("price", "Ensure this value is greater than or equal to 0.");
            return None;
        }
        if value.scale() > DECIMAL_PLACES {
            errors.add(
                "price",
                format!("Ensure that there are no more than {} decimal places.", DECIMAL_PLACES),
            );
            return None;
        }
        let whole_digits = value.trunc().abs().to_string().trim_start_matches('0').len() as u32;
        if whole_digits > MAX_DIGITS - DECIMAL_PLACES {
            errors.add(
                "price",
                format!(
                    "Ensure that there are no more than {} digits before the decimal point.",
                    MAX_DIGITS - DECIMAL_PLACES
                ),
            );
            return None;
        }
        let mut value = value;
        value.rescale(DECIMAL_PLACES);
        Some(value)
    }

    fn clean_instock(&self, errors: &mut FormErrors) -> Option<i32> {
        let Some(raw) = self.submission.value("instock") else {
            errors.add_required("instock");
            return None;
        };
        match raw.parse::<i32>() {
            Ok(n) if n >= 0 => Some(n),
            Ok(_) => {
                errors.add("instock", "Ensure this value is greater than or equal to 0.");
                None
            }
            Err(_) => {
                errors.add("instock", "Enter a whole number.");
                None
            }
        }
    }

    /// Blank on create generates a fresh code; blank on update keeps the current one.
    async fn clean_code(&self, store: &dyn CatalogStore, errors: &mut FormErrors) -> Result<Option<String>, AppError> {
        let exclude = self.instance.map(|p| p.id);
        let Some(raw) = self.submission.value("code") else {
            if let Some(current) = self.instance {
                return Ok(Some(current.code.clone()));
            }
            for _ in 0..CODE_ATTEMPTS {
                let candidate = generate_code();
                if !store.product_code_exists(&candidate, None).await? {
                    return Ok(Some(candidate));
                }
            }
            return Err(AppError::Conflict("could not generate a unique product code".into()));
        };
        let spec = &PRODUCT_FIELDS[3];
        if let Some(max) = spec.max_length {
            let len = raw.chars().count();
            if len > max {
                errors.add("code", format!("Ensure this value has at most {} characters (it has {}).", max, len));
                return Ok(None);
            }
        }
        if !code_pattern().is_match(raw) {
            errors.add("code", "Use only letters, digits, hyphens and underscores.");
            return Ok(None);
        }
        if store.product_code_exists(raw, exclude).await? {
            errors.add("code", DUPLICATE_CODE);
            return Ok(None);
        }
        Ok(Some(raw.to_string()))
    }

    async fn clean_category(&self, store: &dyn CatalogStore, errors: &mut FormErrors) -> Result<Option<i64>, AppError> {
        let Some(raw) = self.submission.value("category") else {
            errors.add_required("category");
            return Ok(None);
        };
        let found = match raw.parse::<i64>() {
            Ok(id) => store.get_category(id).await?,
            Err(_) => None,
        };
        match found {
            Some(category) => Ok(Some(category.id)),
            None => {
                errors.add("category", INVALID_CHOICE);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryInput;
    use crate::store::MemoryCatalogStore;

    async fn store_with_category() -> (MemoryCatalogStore, i64) {
        let store = MemoryCatalogStore::new();
        let c = store
            .insert_category(&CategoryInput {
                name: "Shirts".into(),
                description: "Tops".into(),
                image: None,
            })
            .await
            .unwrap();
        (store, c.id)
    }

    fn submission(pairs: &[(&str, &str)]) -> FormSubmission {
        FormSubmission {
            fields: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            image: None,
        }
    }

    fn valid(category: &str) -> Vec<(&'static str, String)> {
        vec![
            ("name", "Linen Shirt".into()),
            ("price", "19.9".into()),
            ("instock", "4".into()),
            ("description", "Breathable".into()),
            ("category", category.to_string()),
        ]
    }

    fn owned(pairs: Vec<(&'static str, String)>) -> FormSubmission {
        FormSubmission {
            fields: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            image: None,
        }
    }

    fn errors_of(err: AppError) -> FormErrors {
        match err {
            AppError::Form(rejection) => rejection.errors,
            other => panic!("expected form error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn valid_submission_generates_code_and_scales_price() {
        let (store, cat) = store_with_category().await;
        let sub = owned(valid(&cat.to_string()));
        let cleaned = ProductForm::new(&sub, None).clean(&store).await.unwrap();
        assert_eq!(cleaned.input.price.to_string(), "19.90");
        assert_eq!(cleaned.input.code.len(), 8);
        assert_eq!(cleaned.input.code, cleaned.input.code.to_uppercase());
        assert_eq!(cleaned.input.category_id, cat);
    }

    #[tokio::test]
    async fn every_bad_field_gets_its_own_error() {
        let (store, _) = store_with_category().await;
        let sub = submission(&[
            ("name", ""),
            ("price", "-1"),
            ("instock", "2.5"),
            ("code", "has space"),
            ("category", "999"),
        ]);
        let errors = errors_of(ProductForm::new(&sub, None).clean(&store).await.unwrap_err());
        assert!(errors.has("name"));
        assert_eq!(errors.get("price"), ["Ensure this value is greater than or equal to 0."]);
        assert_eq!(errors.get("instock"), ["Enter a whole number."]);
        assert!(errors.has("code"));
        assert!(errors.has("description"));
        assert_eq!(errors.get("category"), [INVALID_CHOICE]);
    }

    #[tokio::test]
    async fn price_precision_is_enforced() {
        let (store, cat) = store_with_category().await;
        for (price, expected) in [
            ("1.999", "Ensure that there are no more than 2 decimal places."),
            ("123456789", "Ensure that there are no more than 8 digits before the decimal point."),
            ("19.900", "Ensure that there are no more than 2 decimal places."),
            ("abc", "Enter a number."),
        ] {
            let mut pairs = valid(&cat.to_string());
            pairs[1].1 = price.into();
            let sub = owned(pairs);
            let errors = errors_of(ProductForm::new(&sub, None).clean(&store).await.unwrap_err());
            assert_eq!(errors.get("price"), [expected], "price {}", price);
        }
    }

    #[tokio::test]
    async fn duplicate_code_rejected_but_own_code_allowed() {
        let (store, cat) = store_with_category().await;
        let mut pairs = valid(&cat.to_string());
        pairs.push(("code", "SKU-1".into()));
        let sub = owned(pairs);
        let first = ProductForm::new(&sub, None).clean(&store).await.unwrap();
        let saved = store.insert_product(&first.input).await.unwrap();

        let errors = errors_of(ProductForm::new(&sub, None).clean(&store).await.unwrap_err());
        assert_eq!(errors.get("code"), [DUPLICATE_CODE]);

        let again = ProductForm::new(&sub, Some(&saved)).clean(&store).await.unwrap();
        assert_eq!(again.input.code, "SKU-1");
    }

    #[tokio::test]
    async fn blank_code_on_update_keeps_current() {
        let (store, cat) = store_with_category().await;
        let sub = owned(valid(&cat.to_string()));
        let saved = store
            .insert_product(&ProductForm::new(&sub, None).clean(&store).await.unwrap().input)
            .await
            .unwrap();
        let cleaned = ProductForm::new(&sub, Some(&saved)).clean(&store).await.unwrap();
        assert_eq!(cleaned.input.code, saved.code);
    }
}
