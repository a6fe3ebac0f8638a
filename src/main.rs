use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod aws_clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod models;
mod repositories;
mod routes;
mod service;
mod startup;
mod storage;
#[cfg(test)]
mod test_support;

use crate::auth::TokenKeys;
use crate::aws_clients::{create_dynamodb_client, create_s3_client, create_sdk_config};
use crate::config::Config;
use crate::domain::UserDirectory;
use crate::errors::AppError;
use crate::repositories::{DynamoPostRepository, DynamoUserDirectory};
use crate::service::PostService;
use crate::storage::S3MediaStore;

/// AppState holds shared resources for the web server.
pub struct AppState {
    pub post_service: PostService,
    pub user_directory: Arc<dyn UserDirectory>,
    pub token_keys: TokenKeys,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "axum_media_feed=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Config::load()?;
    tracing::info!(bind_address = %config.bind_address, bucket = %config.media_bucket_name, "Configuration loaded");

    // --- AWS Client Initialization ---
    let sdk_config = create_sdk_config(&config).await?;
    let db_client = create_dynamodb_client(&sdk_config);
    let s3_client = create_s3_client(&sdk_config);

    // --- Resource Creation (Consider moving outside app startup) ---
    // NOTE: Creating resources here isn't ideal for production.
    // Use IaC (Terraform, CDK, etc.) or manual setup.
    startup::init_resources(
        &db_client,
        &s3_client,
        &config.media_bucket_name,
        &config.aws_region,
    )
    .await?;

    // --- Application State ---
    // Everything the service talks to is constructed here and injected;
    // there is no process-wide singleton client.
    let post_repo = Arc::new(DynamoPostRepository::new(
        db_client.clone(),
        startup::POSTS_TABLE.to_string(),
    ));
    let user_directory: Arc<dyn UserDirectory> = Arc::new(DynamoUserDirectory::new(
        db_client,
        startup::USERS_TABLE.to_string(),
    ));
    let media_store = Arc::new(S3MediaStore::new(
        s3_client,
        config.media_bucket_name.clone(),
        config.media_public_base_url.clone(),
    ));

    let post_service = PostService::new(post_repo, user_directory.clone(), media_store);

    let state = Arc::new(AppState {
        post_service,
        user_directory,
        token_keys: TokenKeys::from_secret(&config.token_secret),
    });

    // --- Router Definition ---
    let app = routes::create_router(state);

    // --- Server Startup ---
    tracing::info!("Server listening on http://{}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
