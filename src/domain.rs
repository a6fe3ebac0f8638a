use crate::errors::{DirectoryError, RepoError, StoreError};
use crate::models::{Post, UserRecord};
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a successful media store upload: where the bytes live and what
/// the store decided to call them.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub stored_name: String,
}

/// Trait defining operations for storing and retrieving Post rows.
#[async_trait]
pub trait PostRepository: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Persists a post as a single atomic write.
    async fn create(&self, post: &Post) -> Result<(), RepoError>;

    /// Retrieves a post by its unique ID.
    /// Returns Ok(None) if the post is not found.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Lists all posts, in no particular order.
    /// WARNING: This can be inefficient on large datasets. Consider pagination.
    async fn list_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Deletes a post row. Deleting an absent row is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Trait defining the narrow contract the post core has with the externally
/// owned user table: identity resolution and email attribution.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    /// Lists all user records. Full scan; acceptable at this scale.
    async fn list_all(&self) -> Result<Vec<UserRecord>, DirectoryError>;
}

/// Trait defining the handoff to the external media store.
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    /// Uploads the bytes under a store-assigned unique name, tagged with the
    /// given tag set. The client filename contributes at most an extension.
    async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<String>,
        tags: &[&str],
    ) -> Result<StoredMedia, StoreError>;
}
