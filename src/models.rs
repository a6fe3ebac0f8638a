use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broad media category of a post, derived from the upload's declared
/// content type at creation time and immutable afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// `video/*` content types become Video; everything else (including a
    /// missing content type) is treated as an image.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("video/") => MediaType::Video,
            _ => MediaType::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

/// A single user-authored media submission. Created only after the media
/// store write succeeds; never mutated afterwards, only deleted.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub caption: Option<String>,
    pub media_url: String,
    pub media_type: MediaType,
    /// Canonical object name assigned by the media store, never the
    /// client-supplied filename.
    pub stored_name: String,
    pub created_at: DateTime<Utc>,
}

/// A post as served in the feed: the stored fields plus the requester's
/// ownership flag and the author's display email.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnrichedPost {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub caption: Option<String>,
    pub media_url: String,
    pub media_type: MediaType,
    pub stored_name: String,
    pub created_at: DateTime<Utc>,
    pub is_owner: bool,
    pub email: String,
}

/// Account record owned by the auth side of the system. The post core only
/// reads `id` and `email`. Not serialized; the hash never leaves the crate.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_content_types_map_to_video() {
        assert_eq!(
            MediaType::from_content_type(Some("video/mp4")),
            MediaType::Video
        );
        assert_eq!(
            MediaType::from_content_type(Some("video/webm")),
            MediaType::Video
        );
    }

    #[test]
    fn non_video_content_types_map_to_image() {
        assert_eq!(
            MediaType::from_content_type(Some("image/jpeg")),
            MediaType::Image
        );
        assert_eq!(
            MediaType::from_content_type(Some("application/octet-stream")),
            MediaType::Image
        );
        assert_eq!(MediaType::from_content_type(None), MediaType::Image);
    }

    #[test]
    fn media_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MediaType::Image).unwrap(),
            "\"image\""
        );
        assert_eq!(
            serde_json::to_string(&MediaType::Video).unwrap(),
            "\"video\""
        );
    }
}
