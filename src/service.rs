use crate::{
    domain::{MediaStore, PostRepository, UserDirectory},
    errors::AppError,
    models::{EnrichedPost, MediaType, Post},
};
use chrono::Utc;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing;
use uuid::Uuid;

/// Tag set attached to every media store upload.
const UPLOAD_TAGS: &[&str] = &["backend-upload"];

/// Sentinel author email when the owning user record no longer exists
/// (e.g. a deleted account).
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Orchestrates the post lifecycle: upload handoff, persistence, feed
/// assembly and owner-only deletion. All collaborators are injected; there
/// is no process-wide client state.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserDirectory>,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserDirectory>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self { posts, users, media }
    }

    /// Uploads the media to the external store, then persists the post as a
    /// single write. If the store call fails no row is created. If the row
    /// write fails after a successful upload the remote object is orphaned;
    /// that gap is logged and accepted, no compensating delete is attempted.
    pub async fn create_post(
        &self,
        owner_id: Uuid,
        caption: Option<String>,
        data: Vec<u8>,
        filename: &str,
        content_type: Option<String>,
    ) -> Result<Post, AppError> {
        // Spool the bytes to a temp file scoped to this call. The file is
        // removed on drop on every exit path, including errors below.
        let mut spool = NamedTempFile::new()?;
        spool.write_all(&data)?;
        spool.flush()?;

        let media_type = MediaType::from_content_type(content_type.as_deref());

        let stored = self
            .media
            .upload(data, filename, content_type, UPLOAD_TAGS)
            .await?;

        let post = Post {
            id: Uuid::new_v4(),
            owner_id,
            caption,
            media_url: stored.url,
            media_type,
            stored_name: stored.stored_name,
            created_at: Utc::now(),
        };

        if let Err(e) = self.posts.create(&post).await {
            tracing::error!(
                post_id = %post.id,
                stored_name = %post.stored_name,
                error = ?e,
                "Post row insert failed after a successful media upload; remote object is orphaned"
            );
            return Err(e.into());
        }

        tracing::info!(post_id = %post.id, owner_id = %owner_id, media_type = %post.media_type.as_str(), "Post created");
        Ok(post)
    }

    /// Assembles the feed: every post, newest first, enriched with the
    /// requester's ownership flag and the author's email. An empty post set
    /// yields an empty vec, not an error.
    pub async fn get_feed(&self, requester_id: Uuid) -> Result<Vec<EnrichedPost>, AppError> {
        let mut posts = self.posts.list_all().await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let emails: HashMap<Uuid, String> = self
            .users
            .list_all()
            .await?
            .into_iter()
            .map(|u| (u.id, u.email))
            .collect();

        let feed = posts
            .into_iter()
            .map(|post| {
                let email = emails
                    .get(&post.owner_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
                EnrichedPost {
                    is_owner: post.owner_id == requester_id,
                    email,
                    id: post.id,
                    owner_id: post.owner_id,
                    caption: post.caption,
                    media_url: post.media_url,
                    media_type: post.media_type,
                    stored_name: post.stored_name,
                    created_at: post.created_at,
                }
            })
            .collect();

        Ok(feed)
    }

    /// Deletes a post. Ownership is the only authorization rule; the 403
    /// response reveals nothing about the post beyond "forbidden". The
    /// remote media object is deliberately left behind.
    pub async fn delete_post(&self, requester_id: Uuid, post_id: Uuid) -> Result<(), AppError> {
        let post = self
            .posts
            .get_by_id(post_id)
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        if post.owner_id != requester_id {
            tracing::warn!(post_id = %post_id, requester_id = %requester_id, "Rejected delete attempt by non-owner");
            return Err(AppError::NotPostOwner);
        }

        self.posts.delete(post_id).await?;
        tracing::info!(post_id = %post_id, owner_id = %requester_id, "Post deleted");
        Ok(())
    }
}
