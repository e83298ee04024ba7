//! Lenient RSS item extraction.
//!
//! Classifieds feeds are frequently malformed, so items are pulled out with
//! regular expressions instead of a strict XML parser. Anything that does not
//! look like an `<item>` is ignored and a feed with no items yields an empty
//! list rather than an error.

use crate::domain::model::{Listing, Search};
use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

const ID_LENGTH: usize = 24;

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<item>(.*?)</item>").expect("item pattern"));
static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!\[CDATA\[(.*?)\]\]>").expect("cdata pattern"));
static IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("img pattern")
});
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+(?:\.\d{2})?").expect("price pattern"));

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| tag_pattern("title"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| tag_pattern("link"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| tag_pattern("description"));
static PUB_DATE_RE: LazyLock<Regex> = LazyLock::new(|| tag_pattern("pubDate"));

fn tag_pattern(tag: &str) -> Regex {
    let tag = regex::escape(tag);
    Regex::new(&format!(r"(?is)<{tag}[^>]*>(.*?)</{tag}>")).expect("tag pattern")
}

/// Body of the first matching element, CDATA unwrapped and trimmed.
fn tag_text(item: &str, pattern: &Regex) -> String {
    pattern
        .captures(item)
        .and_then(|caps| caps.get(1))
        .map(|m| CDATA_RE.replace_all(m.as_str(), "$1").trim().to_string())
        .unwrap_or_default()
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Stable identity for a listing: a truncated SHA-256 hex digest of the
/// whole link, so links sharing a long prefix still get distinct ids.
pub fn listing_id(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(ID_LENGTH);
    id
}

pub fn extract_image(description: &str) -> Option<String> {
    IMG_RE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract_price(text: &str) -> Option<String> {
    PRICE_RE.find(text).map(|m| m.as_str().to_string())
}

/// RSS dates are RFC 2822; some feeds emit RFC 3339 instead.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_feed(xml: &str, search: &Search, fetched_at: DateTime<Utc>) -> Vec<Listing> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|item| parse_item(item.as_str(), search, fetched_at))
        .collect()
}

fn parse_item(item: &str, search: &Search, fetched_at: DateTime<Utc>) -> Listing {
    let title = decode_entities(&tag_text(item, &TITLE_RE));
    let link = tag_text(item, &LINK_RE);
    let description = tag_text(item, &DESCRIPTION_RE);
    let pub_date = tag_text(item, &PUB_DATE_RE);

    let date = parse_pub_date(&pub_date).unwrap_or_else(|| {
        if !pub_date.is_empty() {
            tracing::debug!("Unparseable pubDate '{}' in {}", pub_date, search.name);
        }
        fetched_at
    });

    Listing {
        id: listing_id(&link),
        image: extract_image(&description),
        price: extract_price(&format!("{} {}", title, description)),
        title,
        link,
        source: search.source.clone(),
        search_name: search.name.clone(),
        date,
    }
}
