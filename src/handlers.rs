use crate::{
    AppState,
    auth::{self, AuthUser},
    errors::AppError,
    models::UserRecord,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Handler for POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if state
        .user_directory
        .find_by_email(&body.email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailTaken);
    }

    let user = UserRecord {
        id: Uuid::new_v4(),
        email: body.email,
        password_hash: auth::hash_password(&body.password)?,
        is_active: true,
    };
    state.user_directory.create(&user).await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": user.id, "email": user.email })),
    ))
}

/// Handler for POST /auth/jwt/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_directory
        .find_by_email(&body.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !auth::verify_password(&body.password, &user.password_hash)? {
        // Same message as the unknown-email path; don't leak which part failed
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.token_keys.issue_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(serde_json::json!({
        "access_token": token,
        "token_type": "bearer",
    })))
}

/// Handler for POST /upload: multipart `caption` (optional) + `file`
/// (required). The authenticated user becomes the post owner.
pub async fn upload_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut caption: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        match field_name.as_str() {
            "caption" => {
                caption = Some(field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read caption: {}", e))
                })?)
            }
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_content_type = field.content_type().map(|m| m.to_string());
                file_data = Some(field.bytes().await?.to_vec());
            }
            _ => tracing::debug!("Ignoring unknown multipart field: {}", field_name),
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::MissingFormField("file".to_string()))?;
    if file_data.is_empty() {
        return Err(AppError::InvalidInput("file data cannot be empty".to_string()));
    }
    let file_name = file_name.unwrap_or_else(|| "upload.bin".to_string());
    let caption = caption.filter(|c| !c.is_empty());

    let post = state
        .post_service
        .create_post(user.id, caption, file_data, &file_name, file_content_type)
        .await?;

    Ok(Json(post))
}

/// Handler for GET /feed: every post, newest first, enriched for the
/// requesting user.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let feed = state.post_service.get_feed(user.id).await?;
    tracing::debug!(requester_id = %user.id, posts = feed.len(), "Feed assembled");
    Ok(Json(serde_json::json!({ "posts": feed })))
}

/// Handler for DELETE /posts/{id}. Only the owner may delete.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post_id = Uuid::parse_str(&id_str)?;

    state.post_service.delete_post(user.id, post_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Post deleted successfully",
    })))
}
