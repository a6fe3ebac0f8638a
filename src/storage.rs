use crate::{
    domain::{MediaStore, StoredMedia},
    errors::StoreError,
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::{Client as S3Client, primitives::ByteStream};
use tracing;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct S3MediaStore {
    client: S3Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3MediaStore {
    pub fn new(client: S3Client, bucket_name: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket_name,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Derives the store-assigned object name: a fresh uuid plus a sanitized
    /// extension taken from the client filename. The client filename itself
    /// is never used as storage identity.
    fn assign_object_name(filename: &str) -> String {
        let extension = filename
            .rsplit('.')
            .next()
            .map(|ext| ext.to_lowercase())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= 8
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| "bin".to_string());
        format!("{}.{}", Uuid::new_v4(), extension)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    /// Uploads data to S3 using PutObject. Sets Content-Type and the tag set.
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<String>,
        tags: &[&str],
    ) -> Result<StoredMedia, StoreError> {
        let key = Self::assign_object_name(filename);

        // Guess content type from the assigned key if the client didn't say
        let final_content_type = content_type
            .or_else(|| mime_guess::from_path(&key).first_raw().map(|s| s.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let tagging = tags
            .iter()
            .map(|t| format!("origin={}", t))
            .collect::<Vec<_>>()
            .join("&");

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, content_type = %final_content_type, "S3: Uploading file");

        let body = ByteStream::from(data);
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .body(body)
            .content_type(final_content_type)
            .tagging(tagging)
            .send()
            .await
            .context(format!("S3: Failed to upload object with key '{}'", key))
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;

        tracing::debug!(s3_key = %key, bucket = %self.bucket_name, "S3: Upload successful");

        Ok(StoredMedia {
            url: format!("{}/{}/{}", self.public_base_url, self.bucket_name, key),
            stored_name: key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_keeps_sane_extensions() {
        let name = S3MediaStore::assign_object_name("holiday photo.JPG");
        assert!(name.ends_with(".jpg"));
        // Everything before the extension must be a parseable uuid
        let stem = name.trim_end_matches(".jpg");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn object_name_rejects_suspect_extensions() {
        assert!(S3MediaStore::assign_object_name("no_extension").ends_with(".bin"));
        assert!(S3MediaStore::assign_object_name("weird.ex t").ends_with(".bin"));
        assert!(S3MediaStore::assign_object_name("dotfile.").ends_with(".bin"));
    }

    #[test]
    fn object_names_are_unique_per_upload() {
        let a = S3MediaStore::assign_object_name("same.png");
        let b = S3MediaStore::assign_object_name("same.png");
        assert_ne!(a, b);
    }
}
