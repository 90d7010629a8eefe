use anyhow::Result;
use reqwest::Method;

use crate::api::{ApiClient, RequestOptions};
use crate::models::{CreatePostInput, ListResponse, Page, Post, UpdatePostInput};

/// Typed access to the posts collection. Errors from the gateway are passed
/// through untouched; callers can `downcast_ref::<ApiError>()` them.
#[derive(Clone)]
pub struct PostsClient {
    api: ApiClient,
}

impl PostsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fetches the page behind `cursor`, or the first page when there is none.
    /// The cursor is used exactly as the server handed it out.
    pub async fn list_page(&self, cursor: Option<&str>) -> Result<Page> {
        let endpoint = cursor.unwrap_or("");
        let response: ListResponse = self
            .api
            .request(endpoint, RequestOptions::new(Method::GET))
            .await?;
        let page = Page::from(response);
        tracing::debug!(
            posts = page.results.len(),
            count = page.count,
            has_next = page.next.is_some(),
            "fetched page"
        );
        Ok(page)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.list_page(None).await?.results)
    }

    pub async fn create(&self, input: &CreatePostInput) -> Result<Post> {
        let options = RequestOptions::new(Method::POST).json(input)?;
        Ok(self.api.request("", options).await?)
    }

    pub async fn update(&self, post_id: i64, input: &UpdatePostInput) -> Result<Post> {
        let options = RequestOptions::new(Method::PATCH).json(input)?;
        Ok(self.api.request(&format!("{post_id}/"), options).await?)
    }

    pub async fn delete(&self, post_id: i64) -> Result<()> {
        self.api
            .request::<()>(&format!("{post_id}/"), RequestOptions::new(Method::DELETE))
            .await?;
        Ok(())
    }
}
