use anyhow::Result;
use httpmock::prelude::*;
use listing_proxy::domain::model::Search;
use listing_proxy::server::{self, AppState, LISTINGS_PATH};
use listing_proxy::{Aggregator, EtlEngine, HttpFeedFetcher, ListingsPipeline, LocalStorage};
use std::time::Duration;
use tempfile::TempDir;

const EBAY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>eBay</title>
<item>
  <title><![CDATA[YES Hel YES 149 Snowboard - $289.99]]></title>
  <link>https://www.ebay.com/itm/1001</link>
  <description><![CDATA[<img src="https://i.ebayimg.com/1001.jpg">]]></description>
  <pubDate>Wed, 06 Nov 2024 10:00:00 GMT</pubDate>
</item>
<item>
  <title>YES Women&#39;s Basic</title>
  <link>https://www.ebay.com/itm/1002</link>
  <pubDate>Fri, 01 Nov 2024 10:00:00 GMT</pubDate>
</item>
</channel></rss>"#;

const CRAIGSLIST_FEED: &str = r#"<rss><channel>
<item>
  <title>YES snowboard &amp; bindings</title>
  <link>https://seattle.craigslist.org/see/sgd/2001.html</link>
  <description>Barely used, $150</description>
  <pubDate>Thu, 07 Nov 2024 08:00:00 -0800</pubDate>
</item>
<item>
  <title><![CDATA[YES Hel YES 149 Snowboard - $289.99]]></title>
  <link>https://www.ebay.com/itm/1001</link>
  <pubDate>Thu, 07 Nov 2024 09:00:00 GMT</pubDate>
</item>
</channel></rss>"#;

async fn mock_feeds(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ebay");
            then.status(200)
                .header("Content-Type", "application/rss+xml")
                .body(EBAY_FEED);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/craigslist");
            then.status(200)
                .header("Content-Type", "application/rss+xml")
                .body(CRAIGSLIST_FEED);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/blocked");
            then.status(403);
        })
        .await;
}

fn aggregator(server: &MockServer) -> Aggregator<HttpFeedFetcher> {
    let fetcher = HttpFeedFetcher::new(Duration::from_secs(5), "listing-proxy-test").unwrap();
    Aggregator::new(
        fetcher,
        vec![
            Search::new("eBay - YES", "ebay", server.url("/ebay")),
            Search::new("Craigslist Seattle - YES", "craigslist", server.url("/craigslist")),
            Search::new("Craigslist Spokane - YES", "craigslist", server.url("/blocked")),
        ],
    )
}

#[tokio::test]
async fn test_end_to_end_listings_endpoint() -> Result<()> {
    let feeds = MockServer::start_async().await;
    mock_feeds(&feeds).await;

    let router = server::build_router(AppState::new(aggregator(&feeds)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(server::serve(listener, router, std::future::pending()));

    let resp = reqwest::get(format!("http://{}{}", addr, LISTINGS_PATH)).await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert!(body["fetchedAt"].is_string());

    // 3 distinct links across 4 items
    assert_eq!(body["totalListings"], 3);
    let listings = body["listings"].as_array().unwrap();
    let links: Vec<&str> = listings
        .iter()
        .map(|l| l["link"].as_str().unwrap())
        .collect();
    assert_eq!(
        links,
        vec![
            "https://seattle.craigslist.org/see/sgd/2001.html",
            "https://www.ebay.com/itm/1001",
            "https://www.ebay.com/itm/1002",
        ]
    );

    // the duplicate keeps the record from the first search that produced it
    assert_eq!(listings[1]["searchName"], "eBay - YES");
    assert_eq!(listings[1]["source"], "ebay");
    assert_eq!(listings[1]["price"], "$289.99");
    assert_eq!(listings[1]["image"], "https://i.ebayimg.com/1001.jpg");
    assert_eq!(listings[0]["title"], "YES snowboard & bindings");
    assert_eq!(listings[0]["price"], "$150");
    assert_eq!(listings[2]["title"], "YES Women's Basic");
    assert!(listings[2]["price"].is_null());

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["status"], "success");
    assert_eq!(sources[0]["count"], 2);
    assert!(sources[0].get("error").is_none());
    assert_eq!(sources[1]["count"], 2);
    assert_eq!(sources[2]["name"], "Craigslist Spokane - YES");
    assert_eq!(sources[2]["status"], "error");
    assert_eq!(sources[2]["count"], 0);
    assert_eq!(sources[2]["error"], "HTTP 403");

    Ok(())
}

#[tokio::test]
async fn test_unreachable_feed_is_reported_not_fatal() -> Result<()> {
    let feeds = MockServer::start_async().await;
    mock_feeds(&feeds).await;

    // bind then drop to get a port nothing listens on
    let closed = std::net::TcpListener::bind("127.0.0.1:0")?;
    let closed_url = format!("http://{}/rss", closed.local_addr()?);
    drop(closed);

    let fetcher = HttpFeedFetcher::new(Duration::from_secs(5), "listing-proxy-test")?;
    let aggregator = Aggregator::new(
        fetcher,
        vec![
            Search::new("Closed", "craigslist", closed_url),
            Search::new("eBay - YES", "ebay", feeds.url("/ebay")),
        ],
    );

    let response = aggregator.collect().await;

    assert_eq!(response.total_listings, 2);
    assert_eq!(response.sources[0].count, 0);
    assert!(response.sources[0].error.is_some());
    assert_eq!(response.sources[1].count, 2);
    Ok(())
}

#[tokio::test]
async fn test_slow_feed_reports_timeout() -> Result<()> {
    let feeds = MockServer::start_async().await;
    feeds
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(3)).body(EBAY_FEED);
        })
        .await;

    let fetcher = HttpFeedFetcher::new(Duration::from_millis(200), "listing-proxy-test")?;
    let aggregator = Aggregator::new(
        fetcher,
        vec![Search::new("Slow", "ebay", feeds.url("/slow"))],
    );

    let reports = aggregator.fetch_all().await;

    assert_eq!(reports[0].error.as_deref(), Some("Request timeout"));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_run_writes_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let feeds = MockServer::start_async().await;
    mock_feeds(&feeds).await;

    let storage = LocalStorage::new(&output_path);
    let pipeline = ListingsPipeline::new(storage, aggregator(&feeds), output_path.clone());
    let result = EtlEngine::new(pipeline).run().await?;

    assert_eq!(result, output_path);

    let json = std::fs::read_to_string(temp_dir.path().join("listings.json"))?;
    let body: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(body["totalListings"], 3);
    assert_eq!(body["sources"][2]["error"], "HTTP 403");

    let csv = std::fs::read_to_string(temp_dir.path().join("listings.csv"))?;
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.starts_with("id,title,price,source,searchName,date,link,image"));
    Ok(())
}
