use crate::error::{AppError, FormErrors};
use crate::extractors::{FormSubmission, IMAGE_FIELD};
use crate::forms::{image_upload, required_text, Cleaned, FieldSpec, Widget};
use crate::models::{Category, CategoryInput};
use crate::store::CatalogStore;

pub const CATEGORY_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        label: "Category Name",
        widget: Widget::Text,
        required: true,
        max_length: Some(100),
        help_text: "Choose a unique name for your category",
    },
    FieldSpec {
        name: "description",
        label: "Description",
        widget: Widget::Textarea,
        required: true,
        max_length: None,
        help_text: "Provide a detailed description of this category",
    },
    FieldSpec {
        name: IMAGE_FIELD,
        label: "Category Image",
        widget: Widget::File,
        required: false,
        max_length: None,
        help_text: "Upload an image to represent this category (optional)",
    },
];

pub const DUPLICATE_NAME: &str = "A category with this name already exists.";

/// Category create/update form. `instance` is the record being edited, if any.
pub struct CategoryForm<'a> {
    submission: &'a FormSubmission,
    instance: Option<&'a Category>,
}

impl<'a> CategoryForm<'a> {
    pub fn new(submission: &'a FormSubmission, instance: Option<&'a Category>) -> Self {
        CategoryForm { submission, instance }
    }

    /// Validate every field; failures come back as `AppError::Form` carrying the submitted values.
    pub async fn clean(&self, store: &dyn CatalogStore) -> Result<Cleaned<CategoryInput>, AppError> {
        let mut errors = FormErrors::new();
        let name = required_text(self.submission, &CATEGORY_FIELDS[0], &mut errors);
        let description = required_text(self.submission, &CATEGORY_FIELDS[1], &mut errors);
        let upload = image_upload(self.submission, IMAGE_FIELD, &mut errors);

        if let Some(name) = &name {
            let exclude = self.instance.map(|c| c.id);
            if store.category_name_exists(name, exclude).await? {
                errors.add("name", DUPLICATE_NAME);
            }
        }

        match (name, description, errors.is_empty()) {
            (Some(name), Some(description), true) => Ok(Cleaned {
                input: CategoryInput {
                    name,
                    description,
                    image: None,
                },
                upload,
            }),
            _ => {
                tracing::warn!(errors = errors.len(), "category form rejected");
                Err(AppError::form(errors, self.submission.fields.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::UploadedImage;
    use crate::store::MemoryCatalogStore;

    fn submission(pairs: &[(&str, &str)]) -> FormSubmission {
        FormSubmission {
            fields: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
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
    async fn missing_fields_are_reported_per_field() {
        let store = MemoryCatalogStore::new();
        let sub = submission(&[("name", "  ")]);
        let errors = errors_of(CategoryForm::new(&sub, None).clean(&store).await.unwrap_err());
        assert_eq!(errors.get("name"), ["This field is required."]);
        assert!(errors.has("description"));
    }

    #[tokio::test]
    async fn duplicate_name_ignores_case() {
        let store = MemoryCatalogStore::new();
        store
            .insert_category(&CategoryInput {
                name: "Shoes".into(),
                description: "d".into(),
                image: None,
            })
            .await
            .unwrap();
        let sub = submission(&[("name", "sHoEs"), ("description", "again")]);
        let errors = errors_of(CategoryForm::new(&sub, None).clean(&store).await.unwrap_err());
        assert_eq!(errors.get("name"), [DUPLICATE_NAME]);
    }

    #[tokio::test]
    async fn editing_does_not_conflict_with_itself() {
        let store = MemoryCatalogStore::new();
        let shoes = store
            .insert_category(&CategoryInput {
                name: "Shoes".into(),
                description: "d".into(),
                image: None,
            })
            .await
            .unwrap();
        let sub = submission(&[("name", "Shoes"), ("description", "updated")]);
        let cleaned = CategoryForm::new(&sub, Some(&shoes)).clean(&store).await.unwrap();
        assert_eq!(cleaned.input.name, "Shoes");
        assert_eq!(cleaned.input.description, "updated");
    }

    #[tokio::test]
    async fn long_names_and_bad_images_are_rejected() {
        let store = MemoryCatalogStore::new();
        let long = "x".repeat(101);
        let mut sub = submission(&[("name", long.as_str()), ("description", "d")]);
        sub.image = Some(UploadedImage {
            file_name: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            bytes: b"hello".to_vec(),
        });
        let errors = errors_of(CategoryForm::new(&sub, None).clean(&store).await.unwrap_err());
        assert!(errors.get("name")[0].contains("at most 100 characters (it has 101)"));
        assert!(errors.has("image"));
    }
}
