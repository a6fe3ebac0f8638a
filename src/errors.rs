use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Post not found with ID: {0}")]
    NotFound(Uuid),

    #[error("Stored item could not be parsed: {0}")]
    DataCorruption(String),

    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// The media store rejected the upload or the call failed in transit.
    /// Either way no durable object reference exists.
    #[error("Media upload failed: {0}")]
    UploadFailed(String),

    #[error("Media store backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Stored user record could not be parsed: {0}")]
    DataCorruption(String),

    #[error("User directory backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Missing form field: {0}")]
    MissingFormField(String),
    #[error("Error processing multipart form data: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),
    #[error("Invalid post ID format: {0}")]
    InvalidUuid(#[from] uuid::Error),

    // Auth errors
    #[error("Authentication required: {0}")]
    Unauthorized(String),
    #[error("You are not authorized to delete this post")]
    NotPostOwner,
    #[error("Email already registered")]
    EmailTaken,

    // Domain/Service level errors (mapped from the layer errors)
    #[error("Post not found with ID: {0}")]
    PostNotFound(Uuid),
    #[error("Could not access post data")]
    RepositoryError(#[source] RepoError),
    #[error("Could not store uploaded media")]
    MediaStoreError(#[source] StoreError),
    #[error("Could not access user directory")]
    DirectoryError(#[source] DirectoryError),

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

// --- Conversions from Domain Errors to AppError ---

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => AppError::PostNotFound(id),
            e => AppError::RepositoryError(e),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::MediaStoreError(err)
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        AppError::DirectoryError(err)
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalServerError(format!("I/O error: {}", err))
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MissingFormField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing form field: {}", field),
            ),
            AppError::MultipartError(e) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid multipart form data: {}", e),
            ),
            AppError::InvalidUuid(e) => {
                (StatusCode::BAD_REQUEST, format!("Invalid ID format: {}", e))
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotPostOwner => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::EmailTaken => (StatusCode::CONFLICT, self.to_string()),
            AppError::PostNotFound(_) => (StatusCode::NOT_FOUND, "Post not found".to_string()),

            // 5xx Server Errors: log the detail, keep the body generic
            AppError::RepositoryError(e) => {
                tracing::error!(error.source = ?e, "Repository error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                )
            }
            AppError::MediaStoreError(e) => {
                tracing::error!(error.source = ?e, "Media store error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Media upload failed".to_string(),
                )
            }
            AppError::DirectoryError(e) => {
                tracing::error!(error.source = ?e, "User directory error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "User lookup failed".to_string(),
                )
            }
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AppError::InitError(msg) => {
                tracing::error!("Initialization error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server initialization error".to_string(),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        // 5xx detail is already logged at error level in the arms above;
        // routine client errors only show up with verbose logging.
        tracing::debug!(error.message = %error_message, error.detail = %self, "Responding with error");

        let body = Json(serde_json::json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            status_of(AppError::InvalidInput("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Unauthorized("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AppError::NotPostOwner), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::PostNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(AppError::EmailTaken), StatusCode::CONFLICT);
    }

    #[test]
    fn backend_errors_map_to_500() {
        assert_eq!(
            status_of(AppError::from(RepoError::BackendError(anyhow::anyhow!(
                "boom"
            )))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::from(StoreError::UploadFailed(
                "store returned 503".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
