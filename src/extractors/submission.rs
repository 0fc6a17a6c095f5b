//! Extract a form submission from either a urlencoded or a multipart body.

use crate::error::AppError;
use crate::media::UploadedImage;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use std::collections::{BTreeMap, HashMap};

/// Multipart field that carries the uploaded image.
pub const IMAGE_FIELD: &str = "image";

/// Text fields of a submitted form plus the optional image file.
#[derive(Clone, Debug, Default)]
pub struct FormSubmission {
    pub fields: BTreeMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl FormSubmission {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Trimmed value, `None` when missing or blank.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase());

        match content_type.as_deref() {
            None => Ok(FormSubmission::default()),
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                read_multipart(multipart).await
            }
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                Ok(FormSubmission {
                    fields: fields.into_iter().collect(),
                    image: None,
                })
            }
            Some(other) => Err(AppError::BadRequest(format!("unsupported content type: {}", other))),
        }
    }
}

/// A body-limit overrun stays 413; every other rejection is 400.
fn rejected(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(text)
    } else {
        AppError::BadRequest(text)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormSubmission, AppError> {
    let mut submission = FormSubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }
        match field.file_name().map(str::to_string) {
            Some(file_name) if name == IMAGE_FIELD => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| rejected(e.status(), e.body_text()))?;
                // browsers send an empty part when no file was chosen
                if !file_name.is_empty() && !bytes.is_empty() {
                    submission.image = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some(_) => {}
            None => {
                let text = field.text().await.map_err(|e| rejected(e.status(), e.body_text()))?;
                submission.fields.insert(name, text);
            }
        }
    }
    Ok(submission)
}
