pub mod aggregator;
pub mod etl;
pub mod pipeline;
pub mod rss;

pub use crate::domain::model::{FeedReport, Listing, ListingsResponse, Search};
pub use crate::domain::ports::{ConfigProvider, FeedFetcher, Pipeline, Storage};
pub use crate::utils::error::Result;
