//! StarPets MM2 market integration.
//!
//! Read-only price source. The market exposes a paged POST search over
//! all store items; we walk the pages, keep only the tracked rarity
//! tiers, and collapse duplicate listings to their lowest price.
//!
//! The API sits behind the storefront's own origin checks, so requests
//! carry the site's origin/referer headers.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::{debug, info};

use super::PriceSource;
use crate::types::{ItemKey, Listing, Rarity, WatchError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const API_URL: &str = "https://mm2-market.apineural.com/api/store/items/all";
const SOURCE_NAME: &str = "starpets";

/// Items per page (the storefront's own page size).
const PAGE_SIZE: usize = 72;

/// Hard cap on pages walked per fetch.
const MAX_PAGES: u32 = 24;

/// Pause between page requests, to stay friendly.
const PAGE_DELAY_MS: u64 = 300;

// ---------------------------------------------------------------------------
// API response types (StarPets JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ItemsPage {
    #[serde(default)]
    items: Vec<RawItem>,
}

/// One store item as the API returns it. Only the fields we need.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    name: String,

    /// USD price. Absent for unlisted items.
    #[serde(default)]
    price: Option<Decimal>,

    /// Rarity tier, e.g. "godly", "chroma".
    #[serde(default)]
    rare: String,

    /// Chroma flag. Some chroma items carry `rare: "chroma"` instead.
    #[serde(default)]
    chroma: bool,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// StarPets market client.
pub struct StarPetsClient {
    http: Client,
}

impl StarPetsClient {
    pub fn new() -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ORIGIN,
            header::HeaderValue::from_static("https://starpets.gg"),
        );
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://starpets.gg/"),
        );

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for StarPets")?;

        Ok(Self { http })
    }

    /// Fetch one page of tracked item types, sorted by popularity.
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawItem>> {
        let payload = serde_json::json!({
            "filter": { "types": [ {"type": "weapon"}, {"type": "pet"}, {"type": "misc"} ] },
            "page": page,
            "amount": PAGE_SIZE,
            "currency": "usd",
            "sort": { "popularity": "desc" },
        });

        debug!(page, "Fetching StarPets page");

        let resp = self
            .http
            .post(API_URL)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("StarPets request failed (page {page})"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(WatchError::Fetch {
                source_name: SOURCE_NAME.into(),
                message: format!("page {page} returned {status}"),
            }
            .into());
        }

        let parsed: ItemsPage = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse StarPets page {page}"))?;

        Ok(parsed.items)
    }
}

/// Fold raw items into the listing map, keeping the lowest price per key.
///
/// Drops unpriced items and untracked rarity tiers. An item with the
/// `chroma` flag (or rarity "chroma") keys as the chroma variant.
fn ingest(raw: Vec<RawItem>, listings: &mut HashMap<ItemKey, Listing>) {
    for item in raw {
        let Some(price) = item.price else { continue };
        let Ok(rarity) = item.rare.parse::<Rarity>() else {
            continue;
        };

        let is_chroma = item.chroma || rarity == Rarity::Chroma;
        let key = ItemKey::new(&item.name, is_chroma);
        let price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        match listings.entry(key) {
            Entry::Occupied(mut entry) => {
                if price < entry.get().price {
                    entry.get_mut().price = price;
                }
            }
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                entry.insert(Listing {
                    key,
                    name: item.name.trim().to_string(),
                    rarity,
                    price,
                });
            }
        }
    }
}

#[async_trait]
impl PriceSource for StarPetsClient {
    async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        let mut listings: HashMap<ItemKey, Listing> = HashMap::new();

        for page in 1..=MAX_PAGES {
            let raw = self.fetch_page(page).await?;
            let page_len = raw.len();
            if page_len == 0 {
                break;
            }

            ingest(raw, &mut listings);

            if page_len < PAGE_SIZE {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(PAGE_DELAY_MS)).await;
        }

        info!(count = listings.len(), "StarPets listings fetched");
        Ok(listings.into_values().collect())
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse_items(json: &str) -> Vec<RawItem> {
        serde_json::from_str::<ItemsPage>(json).unwrap().items
    }

    #[test]
    fn test_parse_page() {
        let raw = parse_items(
            r#"{"items": [
                {"name": "Luger", "price": 99.5, "rare": "godly"},
                {"name": "Elderwood Scythe", "price": 12.0, "rare": "ancient", "chroma": false}
            ]}"#,
        );
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].name, "Luger");
        assert_eq!(raw[0].price, Some(dec!(99.5)));
        assert!(!raw[0].chroma);
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_items(r#"{"items": []}"#).is_empty());
        assert!(parse_items(r#"{}"#).is_empty());
    }

    #[test]
    fn test_ingest_filters_untracked_and_unpriced() {
        let raw = parse_items(
            r#"{"items": [
                {"name": "Luger", "price": 99.5, "rare": "godly"},
                {"name": "Common Knife", "price": 0.1, "rare": "common"},
                {"name": "Unlisted", "rare": "godly"}
            ]}"#,
        );
        let mut listings = HashMap::new();
        ingest(raw, &mut listings);
        assert_eq!(listings.len(), 1);
        assert!(listings.contains_key(&ItemKey::new("luger", false)));
    }

    #[test]
    fn test_ingest_keeps_lowest_price_on_duplicates() {
        let raw = parse_items(
            r#"{"items": [
                {"name": "Luger", "price": 99.5, "rare": "godly"},
                {"name": "luger", "price": 95.0, "rare": "godly"},
                {"name": "Luger", "price": 120.0, "rare": "godly"}
            ]}"#,
        );
        let mut listings = HashMap::new();
        ingest(raw, &mut listings);
        let listing = &listings[&ItemKey::new("luger", false)];
        assert_eq!(listing.price, dec!(95.00));
    }

    #[test]
    fn test_ingest_chroma_variants_are_separate() {
        let raw = parse_items(
            r#"{"items": [
                {"name": "Luger", "price": 99.5, "rare": "godly"},
                {"name": "Luger", "price": 250.0, "rare": "godly", "chroma": true},
                {"name": "Fang", "price": 30.0, "rare": "chroma"}
            ]}"#,
        );
        let mut listings = HashMap::new();
        ingest(raw, &mut listings);
        assert_eq!(listings.len(), 3);
        assert_eq!(
            listings[&ItemKey::new("luger", true)].price,
            dec!(250.00)
        );
        // rarity "chroma" implies the chroma variant even without the flag
        assert!(listings.contains_key(&ItemKey::new("fang", true)));
    }

    #[test]
    fn test_ingest_normalizes_price_to_cents() {
        let raw = parse_items(r#"{"items": [{"name": "Luger", "price": 99.555, "rare": "godly"}]}"#);
        let mut listings = HashMap::new();
        ingest(raw, &mut listings);
        assert_eq!(
            listings[&ItemKey::new("luger", false)].price,
            dec!(99.56)
        );
    }
}
