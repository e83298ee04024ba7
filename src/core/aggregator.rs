use crate::core::rss;
use crate::domain::model::{FeedReport, Listing, ListingsResponse, Search};
use crate::domain::ports::FeedFetcher;
use crate::utils::error::ProxyError;
use chrono::Utc;
use std::collections::HashSet;

const SUCCESS_STATUS: u16 = 200;

/// Polls every configured search and merges the results.
pub struct Aggregator<F: FeedFetcher> {
    fetcher: F,
    searches: Vec<Search>,
}

impl<F: FeedFetcher> Aggregator<F> {
    pub fn new(fetcher: F, searches: Vec<Search>) -> Self {
        Self { fetcher, searches }
    }

    /// Fetches searches one after another. A failing feed is recorded in its
    /// report and never stops the remaining ones.
    pub async fn fetch_all(&self) -> Vec<FeedReport> {
        let mut reports = Vec::with_capacity(self.searches.len());

        for search in &self.searches {
            tracing::info!("Fetching: {}", search.name);
            let report = self.fetch_one(search).await;
            match &report.error {
                None => tracing::info!("  ✓ Found {} listings", report.count()),
                Some(error) => tracing::warn!("  ✗ {}: {}", search.name, error),
            }
            reports.push(report);
        }

        reports
    }

    async fn fetch_one(&self, search: &Search) -> FeedReport {
        match self.fetcher.fetch(&search.url).await {
            Ok(feed) if feed.status == SUCCESS_STATUS => {
                let listings = rss::parse_feed(&feed.body, search, Utc::now());
                FeedReport::success(search, listings)
            }
            Ok(feed) => FeedReport::failure(search, format!("HTTP {}", feed.status)),
            Err(e) => FeedReport::failure(search, fetch_error_message(&e)),
        }
    }

    pub async fn collect(&self) -> ListingsResponse {
        let reports = self.fetch_all().await;
        build_response(&reports)
    }
}

fn fetch_error_message(err: &ProxyError) -> String {
    match err {
        ProxyError::HttpError(e) if e.is_timeout() => "Request timeout".to_string(),
        other => other.to_string(),
    }
}

/// Flattens listings in search order, keeps the first listing per id and
/// orders the result newest first. Listings with equal dates keep their
/// relative order.
pub fn merge(reports: &[FeedReport]) -> Vec<Listing> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Listing> = reports
        .iter()
        .flat_map(|report| report.listings.iter())
        .filter(|listing| seen.insert(listing.id.clone()))
        .cloned()
        .collect();

    merged.sort_by(|a, b| b.date.cmp(&a.date));
    merged
}

pub fn build_response(reports: &[FeedReport]) -> ListingsResponse {
    let listings = merge(reports);
    ListingsResponse {
        success: true,
        fetched_at: Utc::now(),
        sources: reports.iter().map(FeedReport::summary).collect(),
        total_listings: listings.len(),
        listings,
    }
}
