//! In-memory fakes of the domain traits, shared across unit test modules.

use crate::domain::{MediaStore, PostRepository, StoredMedia, UserDirectory};
use crate::errors::{DirectoryError, RepoError, StoreError};
use crate::models::{Post, UserRecord};
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryPosts {
    rows: Mutex<Vec<Post>>,
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn create(&self, post: &Post) -> Result<(), RepoError> {
        self.rows.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<Vec<UserRecord>>,
}

impl InMemoryUsers {
    pub fn with_user(self, id: Uuid, email: &str) -> Self {
        self.with_user_record(UserRecord {
            id,
            email: email.to_string(),
            password_hash: "unused".to_string(),
            is_active: true,
        })
    }

    pub fn with_user_record(self, record: UserRecord) -> Self {
        self.rows.lock().unwrap().push(record);
        self
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        self.rows.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Fake media store that either succeeds with a fixed URL or fails the way
/// an unreachable/rejecting store would. Records the bytes it was handed so
/// tests can assert the upload payload.
pub struct FakeMediaStore {
    fail: bool,
    url: String,
    pub uploads: Mutex<Vec<Vec<u8>>>,
}

impl FakeMediaStore {
    pub fn succeeding(url: &str) -> Self {
        Self {
            fail: false,
            url: url.to_string(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            url: String::new(),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(
        &self,
        data: Vec<u8>,
        _filename: &str,
        _content_type: Option<String>,
        _tags: &[&str],
    ) -> Result<StoredMedia, StoreError> {
        if self.fail {
            return Err(StoreError::UploadFailed("store returned 503".to_string()));
        }
        self.uploads.lock().unwrap().push(data);
        Ok(StoredMedia {
            url: self.url.clone(),
            stored_name: "x.jpg".to_string(),
        })
    }
}
