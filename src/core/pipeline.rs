use crate::core::aggregator::{self, Aggregator};
use crate::domain::model::{FeedReport, Listing, ListingsResponse};
use crate::domain::ports::{FeedFetcher, Pipeline, Storage};
use crate::utils::error::{ProxyError, Result};
use chrono::SecondsFormat;
use serde::Serialize;

pub const JSON_SNAPSHOT: &str = "listings.json";
pub const CSV_SNAPSHOT: &str = "listings.csv";

/// One-shot run of the aggregator that writes the merged result to storage.
pub struct ListingsPipeline<S: Storage, F: FeedFetcher> {
    storage: S,
    aggregator: Aggregator<F>,
    output_path: String,
}

impl<S: Storage, F: FeedFetcher> ListingsPipeline<S, F> {
    pub fn new(storage: S, aggregator: Aggregator<F>, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            aggregator,
            output_path: output_path.into(),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    title: &'a str,
    price: Option<&'a str>,
    source: &'a str,
    #[serde(rename = "searchName")]
    search_name: &'a str,
    date: String,
    link: &'a str,
    image: Option<&'a str>,
}

impl<'a> From<&'a Listing> for CsvRow<'a> {
    fn from(listing: &'a Listing) -> Self {
        Self {
            id: &listing.id,
            title: &listing.title,
            price: listing.price.as_deref(),
            source: &listing.source,
            search_name: &listing.search_name,
            date: listing.date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            link: &listing.link,
            image: listing.image.as_deref(),
        }
    }
}

pub fn listings_to_csv(listings: &[Listing]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for listing in listings {
        writer.serialize(CsvRow::from(listing))?;
    }
    writer.into_inner().map_err(|e| ProxyError::ProcessingError {
        message: format!("Failed to flush CSV output: {}", e),
    })
}

#[async_trait::async_trait]
impl<S: Storage, F: FeedFetcher> Pipeline for ListingsPipeline<S, F> {
    async fn extract(&self) -> Result<Vec<FeedReport>> {
        Ok(self.aggregator.fetch_all().await)
    }

    async fn transform(&self, reports: Vec<FeedReport>) -> Result<ListingsResponse> {
        let response = aggregator::build_response(&reports);

        let failed = reports.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            tracing::warn!("{} of {} feeds failed", failed, reports.len());
        }

        Ok(response)
    }

    async fn load(&self, response: ListingsResponse) -> Result<String> {
        let json = serde_json::to_string_pretty(&response)?;
        self.storage
            .write_file(JSON_SNAPSHOT, json.as_bytes())
            .await?;

        let csv = listings_to_csv(&response.listings)?;
        tracing::debug!("Writing CSV snapshot ({} bytes)", csv.len());
        self.storage.write_file(CSV_SNAPSHOT, &csv).await?;

        Ok(self.output_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FetchedFeed, Search};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct StaticFetcher(String);

    #[async_trait::async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedFeed> {
            Ok(FetchedFeed {
                status: 200,
                body: self.0.clone(),
            })
        }
    }

    const FEED: &str = r#"<rss><channel>
<item><title>Older board, $120</title><link>https://l/1</link><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>
<item><title>Newer board</title><link>https://l/2</link>
<description><![CDATA[<img src="https://img/2.jpg"> $300]]></description>
<pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate></item>
</channel></rss>"#;

    fn pipeline(storage: MockStorage) -> ListingsPipeline<MockStorage, StaticFetcher> {
        let aggregator = Aggregator::new(
            StaticFetcher(FEED.to_string()),
            vec![
                Search::new("A", "ebay", "https://feeds/a"),
                Search::new("B", "craigslist", "https://feeds/b"),
            ],
        );
        ListingsPipeline::new(storage, aggregator, "test_output")
    }

    #[tokio::test]
    async fn test_transform_dedupes_identical_feeds() {
        let pipeline = pipeline(MockStorage::new());

        let reports = pipeline.extract().await.unwrap();
        assert_eq!(reports.len(), 2);

        let response = pipeline.transform(reports).await.unwrap();
        assert_eq!(response.total_listings, 2);
        assert_eq!(response.listings[0].title, "Newer board");
        assert_eq!(response.listings[0].search_name, "A");
        assert_eq!(response.sources[1].count, 2);
    }

    #[tokio::test]
    async fn test_load_writes_json_and_csv() {
        let storage = MockStorage::new();
        let pipeline = pipeline(storage.clone());

        let reports = pipeline.extract().await.unwrap();
        let response = pipeline.transform(reports).await.unwrap();
        let output_path = pipeline.load(response).await.unwrap();

        assert_eq!(output_path, "test_output");

        let json = storage.get_file(JSON_SNAPSHOT).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["totalListings"], 2);
        assert_eq!(value["listings"][0]["searchName"], "A");
        assert_eq!(value["listings"][0]["image"], "https://img/2.jpg");
        assert_eq!(value["listings"][1]["price"], "$120");

        let csv = String::from_utf8(storage.get_file(CSV_SNAPSHOT).await.unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,title,price,source,searchName,date,link,image");
        assert!(lines[1].contains("Newer board"));
        assert!(lines[2].contains("\"Older board, $120\""));
        assert!(lines[2].contains(",2024-01-01T00:00:00Z,"));
        assert_eq!(value["listings"][1]["date"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_csv_of_no_listings_is_empty() {
        assert!(listings_to_csv(&[]).unwrap().is_empty());
    }
}
