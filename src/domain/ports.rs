use crate::domain::model::{FeedReport, FetchedFeed, ListingsResponse, Search};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn searches(&self) -> &[Search];
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn output_path(&self) -> &str;
}

/// Transport for a single feed request. Non-2xx statuses are returned, not raised.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FeedReport>>;
    async fn transform(&self, reports: Vec<FeedReport>) -> Result<ListingsResponse>;
    async fn load(&self, response: ListingsResponse) -> Result<String>;
}
