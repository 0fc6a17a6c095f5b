//! Uploaded image storage under the media root.

use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// An image file taken from a multipart submission, not yet written to disk.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Lowercased extension when the file looks like an image, by name and declared content type.
    pub fn image_extension(&self) -> Option<String> {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)?;
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        match self.content_type.as_deref() {
            Some(ct) if !ct.starts_with("image/") => None,
            _ => Some(ext),
        }
    }
}

/// Writes images as `<area>/<uuid>.<ext>` under `root`; records keep the relative path.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MediaStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the upload and return its path relative to the media root.
    /// The caller has already checked `image_extension`.
    pub async fn save(&self, area: &str, image: &UploadedImage) -> std::io::Result<String> {
        let ext = image.image_extension().unwrap_or_else(|| "bin".into());
        let relative = format!("{}/{}.{}", area, uuid::Uuid::new_v4().simple(), ext);
        let full = self.root.join(&relative);
        if let Some(dir) = full.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&full, &image.bytes).await?;
        tracing::info!(path = %relative, bytes = image.bytes.len(), "stored upload");
        Ok(relative)
    }

    /// Pass `result` through, removing the freshly stored file when it is an error.
    pub async fn release_on_error<T, E>(&self, stored: Option<&str>, result: Result<T, E>) -> Result<T, E> {
        if let (Err(_), Some(relative)) = (&result, stored) {
            if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
                tracing::warn!(path = %relative, error = %e, "could not remove orphaned upload");
            } else {
                tracing::info!(path = %relative, "removed orphaned upload");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, ct: Option<&str>) -> UploadedImage {
        UploadedImage {
            file_name: name.into(),
            content_type: ct.map(String::from),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn recognises_images_by_name_and_type() {
        assert_eq!(upload("Photo.PNG", Some("image/png")).image_extension().as_deref(), Some("png"));
        assert_eq!(upload("a.jpg", None).image_extension().as_deref(), Some("jpg"));
        assert!(upload("notes.txt", Some("text/plain")).image_extension().is_none());
        assert!(upload("fake.png", Some("application/pdf")).image_extension().is_none());
        assert!(upload("noext", Some("image/png")).image_extension().is_none());
    }

    #[tokio::test]
    async fn saves_under_area_with_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        let path = media.save("products", &upload("x.png", Some("image/png"))).await.unwrap();
        assert!(path.starts_with("products/"));
        assert!(path.ends_with(".png"));
        let written = tokio::fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(written.len(), 4);
    }

    #[tokio::test]
    async fn failed_write_removes_stored_upload() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        let path = media.save("categories", &upload("x.png", Some("image/png"))).await.unwrap();

        let kept: Result<i32, &str> = media.release_on_error(Some(&path), Ok(1)).await;
        assert_eq!(kept, Ok(1));
        assert!(dir.path().join(&path).exists());

        let failed: Result<i32, &str> = media.release_on_error(Some(&path), Err("conflict")).await;
        assert_eq!(failed, Err("conflict"));
        assert!(!dir.path().join(&path).exists());
    }
}
