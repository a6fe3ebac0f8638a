use crate::{
    domain::{PostRepository, UserDirectory},
    errors::{DirectoryError, RepoError},
    models::{Post, UserRecord},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::{Client as DynamoDbClient, types::AttributeValue};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{self, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DynamoPostRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoPostRepository {
    /// Creates a new repository instance configured for a specific table.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoPostRepository");
        Self { client, table_name }
    }
}

#[async_trait]
impl PostRepository for DynamoPostRepository {
    /// Stores a `Post` in the DynamoDB table using PutItem.
    async fn create(&self, post: &Post) -> Result<(), RepoError> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("id", AttributeValue::S(post.id.to_string()))
            .item("owner_id", AttributeValue::S(post.owner_id.to_string()))
            .item("media_url", AttributeValue::S(post.media_url.clone()))
            .item(
                "media_type",
                AttributeValue::S(post.media_type.as_str().to_string()),
            )
            .item("stored_name", AttributeValue::S(post.stored_name.clone()))
            .item(
                "created_at",
                AttributeValue::S(post.created_at.to_rfc3339()),
            );
        if let Some(caption) = &post.caption {
            request = request.item("caption", AttributeValue::S(caption.clone()));
        }

        request
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to put post (id: {})",
                self.table_name, post.id
            ))
            .map_err(RepoError::BackendError)?;
        Ok(())
    }

    /// Retrieves a `Post` from DynamoDB using GetItem.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let id_str = id.to_string();
        let resp = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id_str.clone()))
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to get post (id: {})",
                self.table_name, id_str
            ))
            .map_err(RepoError::BackendError)?;

        match resp.item {
            Some(item) => match item_to_post(&item) {
                Some(post) => Ok(Some(post)),
                None => {
                    tracing::error!(post_id = %id_str, table_name = %self.table_name, "DynamoDB: Retrieved item but failed to parse into Post");
                    Err(RepoError::DataCorruption(format!(
                        "Failed to parse post data retrieved from DynamoDB table '{}' for id {}",
                        self.table_name, id_str
                    )))
                }
            },
            None => Ok(None), // Item not found is not an error
        }
    }

    /// Lists all posts using DynamoDB Scan. Handles pagination.
    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        tracing::debug!("DynamoDB: Scanning table '{}' for all posts", self.table_name);
        let mut posts: Vec<Post> = Vec::new();
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request_builder = self.client.scan().table_name(&self.table_name);

            // Apply ExclusiveStartKey if paginating from previous response
            if let Some(lek) = last_evaluated_key {
                request_builder = request_builder.set_exclusive_start_key(Some(lek));
            }

            let resp = request_builder
                .send()
                .await
                .context(format!(
                    "DynamoDB: Failed to scan table '{}'",
                    self.table_name
                ))
                .map_err(RepoError::BackendError)?;

            if let Some(items) = resp.items {
                for item in items {
                    match item_to_post(&item) {
                        Some(post) => posts.push(post),
                        None => {
                            let item_id = item.get("id").and_then(|v| v.as_s().ok());
                            tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item from scan into Post");
                            // Fail fast if data in the table is corrupt
                            return Err(RepoError::DataCorruption(format!(
                                "DynamoDB: Failed to parse item {:?} during scan of table '{}'",
                                item_id, self.table_name
                            )));
                        }
                    }
                }
            }

            // Check for next page
            last_evaluated_key = resp.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
            tracing::debug!("DynamoDB Scan (table: {}): Continuing with LastEvaluatedKey...", self.table_name);
        }

        tracing::debug!(
            "DynamoDB (table: {}): Listed {} posts",
            self.table_name,
            posts.len()
        );
        Ok(posts)
    }

    /// Deletes an item from DynamoDB using DeleteItem.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let id_str = id.to_string();
        tracing::debug!(post_id = %id_str, table_name = %self.table_name, "DynamoDB: Deleting item");

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id_str.clone()))
            // DeleteItem succeeds even if item not found; existence and
            // ownership are checked by the service before we get here.
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to delete post (id: {})",
                self.table_name, id_str
            ))
            .map_err(RepoError::BackendError)?;

        Ok(())
    }
}

// Helper function to convert a DynamoDB item map to a Post struct.
// Remains internal to this module.
fn item_to_post(item: &HashMap<String, AttributeValue>) -> Option<Post> {
    let id = item
        .get("id")?
        .as_s()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let owner_id = item
        .get("owner_id")?
        .as_s()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    // Caption is genuinely optional; absence is not corruption.
    let caption = item
        .get("caption")
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string());
    let media_url = item.get("media_url")?.as_s().ok()?.to_string();
    let media_type = item.get("media_type")?.as_s().ok()?.parse().ok()?;
    let stored_name = item.get("stored_name")?.as_s().ok()?.to_string();
    let created_at = item
        .get("created_at")?
        .as_s()
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))?;

    Some(Post {
        id,
        owner_id,
        caption,
        media_url,
        media_type,
        stored_name,
        created_at,
    })
}

#[derive(Debug, Clone)]
pub struct DynamoUserDirectory {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoUserDirectory {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoUserDirectory");
        Self { client, table_name }
    }
}

#[async_trait]
impl UserDirectory for DynamoUserDirectory {
    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        // Duplicate emails are caught by find_by_email in the registration
        // handler; the id put is unconditional since v4 ids don't collide.
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item("id", AttributeValue::S(user.id.to_string()))
            .item("email", AttributeValue::S(user.email.clone()))
            .item(
                "password_hash",
                AttributeValue::S(user.password_hash.clone()),
            )
            .item("is_active", AttributeValue::Bool(user.is_active))
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to put user (id: {})",
                self.table_name, user.id
            ))
            .map_err(DirectoryError::BackendError)?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DirectoryError> {
        let id_str = id.to_string();
        let resp = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id_str.clone()))
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to get user (id: {})",
                self.table_name, id_str
            ))
            .map_err(DirectoryError::BackendError)?;

        match resp.item {
            Some(item) => match item_to_user(&item) {
                Some(user) => Ok(Some(user)),
                None => Err(DirectoryError::DataCorruption(format!(
                    "Failed to parse user data retrieved from DynamoDB table '{}' for id {}",
                    self.table_name, id_str
                ))),
            },
            None => Ok(None),
        }
    }

    /// Email lookup via scan + filter. No GSI; the user table is small and
    /// registration is rare.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let users = self.list_all().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let mut users: Vec<UserRecord> = Vec::new();
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request_builder = self.client.scan().table_name(&self.table_name);
            if let Some(lek) = last_evaluated_key {
                request_builder = request_builder.set_exclusive_start_key(Some(lek));
            }

            let resp = request_builder
                .send()
                .await
                .context(format!(
                    "DynamoDB: Failed to scan table '{}'",
                    self.table_name
                ))
                .map_err(DirectoryError::BackendError)?;

            if let Some(items) = resp.items {
                for item in items {
                    match item_to_user(&item) {
                        Some(user) => users.push(user),
                        None => {
                            let item_id = item.get("id").and_then(|v| v.as_s().ok());
                            tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item from scan into UserRecord");
                            return Err(DirectoryError::DataCorruption(format!(
                                "DynamoDB: Failed to parse item {:?} during scan of table '{}'",
                                item_id, self.table_name
                            )));
                        }
                    }
                }
            }

            last_evaluated_key = resp.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
        }

        Ok(users)
    }
}

fn item_to_user(item: &HashMap<String, AttributeValue>) -> Option<UserRecord> {
    let id = item
        .get("id")?
        .as_s()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let email = item.get("email")?.as_s().ok()?.to_string();
    let password_hash = item.get("password_hash")?.as_s().ok()?.to_string();
    let is_active = *item.get("is_active")?.as_bool().ok()?;

    Some(UserRecord {
        id,
        email,
        password_hash,
        is_active,
    })
}
