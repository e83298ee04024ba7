use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured feed to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    pub name: String,
    pub source: String,
    pub url: String,
}

impl Search {
    pub fn new(name: impl Into<String>, source: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub price: Option<String>,
    pub source: String,
    pub search_name: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Error,
}

/// Outcome of polling a single search.
#[derive(Debug, Clone)]
pub struct FeedReport {
    pub search: String,
    pub source: String,
    pub status: FetchStatus,
    pub error: Option<String>,
    pub listings: Vec<Listing>,
}

impl FeedReport {
    pub fn success(search: &Search, listings: Vec<Listing>) -> Self {
        Self {
            search: search.name.clone(),
            source: search.source.clone(),
            status: FetchStatus::Success,
            error: None,
            listings,
        }
    }

    pub fn failure(search: &Search, error: impl Into<String>) -> Self {
        Self {
            search: search.name.clone(),
            source: search.source.clone(),
            status: FetchStatus::Error,
            error: Some(error.into()),
            listings: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        match self.status {
            FetchStatus::Success => self.listings.len(),
            FetchStatus::Error => 0,
        }
    }

    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            name: self.search.clone(),
            source: self.source.clone(),
            status: self.status,
            count: self.count(),
            error: self.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub source: String,
    pub status: FetchStatus,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsResponse {
    pub success: bool,
    pub fetched_at: DateTime<Utc>,
    pub sources: Vec<SourceSummary>,
    pub total_listings: usize,
    pub listings: Vec<Listing>,
}

/// Raw result of a feed request before any parsing.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub status: u16,
    pub body: String,
}
