//! Photo object storage. `AppState` holds an `Arc<dyn PhotoStore>`;
//! production uses `S3PhotoStore`.

use async_trait::async_trait;
use autosave::{Attachment, ResumeId};
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::errors::AppError;

/// Upper bound on an uploaded photo.
pub const MAX_PHOTO_BYTES: usize = 4 * 1024 * 1024;

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Stores the photo and returns its public URL.
    async fn put(&self, resume_id: ResumeId, photo: &Attachment) -> Result<String, AppError>;

    async fn delete(&self, url: &str) -> Result<(), AppError>;
}

/// Rejects payloads that are not images or exceed [`MAX_PHOTO_BYTES`].
pub fn validate_photo(photo: &Attachment) -> Result<(), AppError> {
    if !photo.content_type().starts_with("image/") {
        return Err(AppError::Validation(format!(
            "Photo must be an image, got '{}'",
            photo.content_type()
        )));
    }
    if photo.is_empty() {
        return Err(AppError::Validation("Photo is empty".to_string()));
    }
    if photo.len() > MAX_PHOTO_BYTES {
        return Err(AppError::Validation(format!(
            "Photo must be at most {} MB",
            MAX_PHOTO_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Object key for a photo. Content-addressed, so re-uploading identical
/// bytes lands on the same key.
pub fn photo_key(resume_id: ResumeId, photo: &Attachment) -> String {
    let extension = match photo.content_type() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    };
    format!(
        "resume_photos/{resume_id}/{}.{extension}",
        photo.fingerprint()
    )
}

pub struct S3PhotoStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3PhotoStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl PhotoStore for S3PhotoStore {
    async fn put(&self, resume_id: ResumeId, photo: &Attachment) -> Result<String, AppError> {
        let key = photo_key(resume_id, photo);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(photo.bytes().clone()))
            .content_type(photo.content_type())
            .send()
            .await
            .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;

        info!("Uploaded photo to s3://{}/{}", self.bucket, key);
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let key = self
            .key_for_url(url)
            .ok_or_else(|| AppError::S3(format!("Photo URL '{url}' is not in this bucket")))?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("S3 delete failed: {e}")))?;

        info!("Deleted photo s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Region};

    fn store() -> S3PhotoStore {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        S3PhotoStore::new(
            aws_sdk_s3::Client::from_conf(conf),
            "photos".into(),
            "http://minio:9000/photos/".into(),
        )
    }

    #[test]
    fn test_key_for_url_strips_public_prefix() {
        let store = store();
        assert_eq!(
            store.key_for_url("http://minio:9000/photos/resume_photos/a/b.png"),
            Some("resume_photos/a/b.png")
        );
        assert_eq!(store.key_for_url("https://elsewhere.example/b.png"), None);
        assert_eq!(store.key_for_url("http://minio:9000/photos/"), None);
    }

    #[test]
    fn test_photo_key_is_content_addressed() {
        let id = ResumeId::new();
        let a = Attachment::new(vec![1u8, 2, 3], "image/png");
        let b = Attachment::new(vec![1u8, 2, 3], "image/png");
        assert_eq!(photo_key(id, &a), photo_key(id, &b));
        assert!(photo_key(id, &a).ends_with(".png"));
        assert!(photo_key(id, &a).starts_with(&format!("resume_photos/{id}/")));
    }

    #[test]
    fn test_validate_photo_rejects_non_images() {
        let pdf = Attachment::new(vec![1u8], "application/pdf");
        assert!(matches!(validate_photo(&pdf), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_photo_rejects_oversize() {
        let big = Attachment::new(vec![0u8; MAX_PHOTO_BYTES + 1], "image/jpeg");
        assert!(matches!(validate_photo(&big), Err(AppError::Validation(_))));
        let ok = Attachment::new(vec![0u8; 1024], "image/jpeg");
        assert!(validate_photo(&ok).is_ok());
    }
}
