pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod mentions;
pub mod models;
pub mod posts;
pub mod reactions;
pub mod session;
pub mod telemetry;
pub mod time;

use anyhow::Result;

pub use api::{ApiClient, ApiError};
pub use app::FeedApp;
pub use config::FeedlineConfig;
pub use posts::PostsClient;

/// Builds the posts client described by `config`.
pub fn connect(config: &FeedlineConfig) -> Result<PostsClient> {
    let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout())?;
    Ok(PostsClient::new(api))
}
