//! Form definitions: field descriptors for the form pages and cleaning of submissions.

mod category;
mod product;

pub use category::{CategoryForm, CATEGORY_FIELDS};
pub use product::{generate_code, ProductForm, PRODUCT_FIELDS};

use crate::error::FormErrors;
use crate::extractors::FormSubmission;
use crate::media::UploadedImage;
use serde::Serialize;

/// How a field is presented and what it accepts.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub help_text: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Text,
    Textarea,
    Number,
    Select,
    File,
}

/// A valid submission: the store input plus an image still to be written.
#[derive(Debug)]
pub struct Cleaned<T> {
    pub input: T,
    pub upload: Option<UploadedImage>,
}

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Required text with the usual whitespace stripping and length cap.
fn required_text(submission: &FormSubmission, spec: &FieldSpec, errors: &mut FormErrors) -> Option<String> {
    let Some(value) = submission.value(spec.name) else {
        errors.add_required(spec.name);
        return None;
    };
    if let Some(max) = spec.max_length {
        let len = value.chars().count();
        if len > max {
            errors.add(
                spec.name,
                format!("Ensure this value has at most {} characters (it has {}).", max, len),
            );
            return None;
        }
    }
    Some(value.to_string())
}

fn image_upload(submission: &FormSubmission, field: &str, errors: &mut FormErrors) -> Option<UploadedImage> {
    let image = submission.image.as_ref()?;
    if image.image_extension().is_none() {
        errors.add(field, INVALID_IMAGE);
        return None;
    }
    Some(image.clone())
}
