//! Shopify target-store integration.
//!
//! Two halves:
//! - catalog read via the store's public `/products.json` pages, used to
//!   map item keys to the variant IDs the admin API needs;
//! - authenticated variant price updates via the Admin API.
//!
//! The store follows the "Chroma <item>" title convention for chroma
//! variants, which is how catalog entries key back to source listings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::CatalogStore;
use crate::config::ShopifyConfig;
use crate::types::{CatalogEntry, ItemKey, WatchError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const STORE_NAME: &str = "shopify";

/// Admin API version pinned for variant updates.
const ADMIN_API_VERSION: &str = "2024-01";

/// Products per catalog page (Shopify's `/products.json` maximum).
const CATALOG_PAGE_SIZE: usize = 250;

/// Hard cap on catalog pages walked per fetch.
const MAX_CATALOG_PAGES: u32 = 4;

/// Pause between catalog page requests.
const PAGE_DELAY_MS: u64 = 300;

// ---------------------------------------------------------------------------
// API response types (Shopify JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    id: u64,
    title: String,
    #[serde(default)]
    variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
struct Variant {
    id: u64,
    /// Shopify serializes prices as strings, e.g. `"94.05"`.
    price: String,
}

// ---------------------------------------------------------------------------
// Title convention
// ---------------------------------------------------------------------------

/// Derive the source item key from a product title.
///
/// A leading "chroma " marks the chroma variant; the remainder is the
/// base item name.
fn catalog_key(title: &str) -> ItemKey {
    let lower = title.trim().to_lowercase();
    match lower.strip_prefix("chroma ") {
        Some(base) => ItemKey::new(base, true),
        None => ItemKey::new(&lower, false),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Shopify store client. Needs an Admin API token for price updates;
/// the catalog read is public.
pub struct ShopifyClient {
    http: Client,
    store: String,
    token: String,
}

impl ShopifyClient {
    pub fn new(cfg: &ShopifyConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client for Shopify")?;

        Ok(Self {
            http,
            store: cfg.store.clone(),
            token: cfg.token.clone(),
        })
    }

    async fn fetch_catalog_page(&self, page: u32) -> Result<Vec<Product>> {
        let url = format!(
            "https://{}/products.json?page={page}&limit={CATALOG_PAGE_SIZE}",
            self.store
        );

        debug!(page, "Fetching Shopify catalog page");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Shopify catalog request failed (page {page})"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(WatchError::Fetch {
                source_name: STORE_NAME.into(),
                message: format!("catalog page {page} returned {status}"),
            }
            .into());
        }

        let parsed: ProductsPage = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Shopify catalog page {page}"))?;

        Ok(parsed.products)
    }
}

#[async_trait]
impl CatalogStore for ShopifyClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let mut entries = Vec::new();

        for page in 1..=MAX_CATALOG_PAGES {
            let products = self.fetch_catalog_page(page).await?;
            if products.is_empty() {
                break;
            }
            let page_len = products.len();

            for product in products {
                let Some(variant) = product.variants.first() else {
                    continue;
                };
                let price: Decimal = match variant.price.parse() {
                    Ok(p) => p,
                    Err(_) => {
                        warn!(
                            product_id = product.id,
                            price = %variant.price,
                            "Skipping product with unparseable price"
                        );
                        continue;
                    }
                };

                entries.push(CatalogEntry {
                    key: catalog_key(&product.title),
                    title: product.title.trim().to_string(),
                    product_id: product.id,
                    variant_id: variant.id,
                    price,
                });
            }

            if page_len < CATALOG_PAGE_SIZE {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(PAGE_DELAY_MS)).await;
        }

        info!(count = entries.len(), "Shopify catalog fetched");
        Ok(entries)
    }

    async fn update_price(&self, variant_id: u64, price: Decimal) -> Result<()> {
        let url = format!(
            "https://{}/admin/api/{ADMIN_API_VERSION}/variants/{variant_id}.json",
            self.store
        );

        // Shopify wants the price as a string.
        let payload = serde_json::json!({
            "variant": { "id": variant_id, "price": price.to_string() },
        });

        let resp = self
            .http
            .put(&url)
            .header("X-Shopify-Access-Token", &self.token)
            .json(&payload)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Shopify variant update failed (variant {variant_id})"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WatchError::Update {
                item: variant_id.to_string(),
                message: format!("{status}: {body}"),
            }
            .into());
        }

        debug!(variant_id, price = %price, "Shopify variant updated");
        Ok(())
    }

    fn name(&self) -> &str {
        STORE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalog_key_regular() {
        let key = catalog_key("Luger");
        assert_eq!(key, ItemKey::new("luger", false));
        assert!(!key.is_chroma());
    }

    #[test]
    fn test_catalog_key_chroma_prefix() {
        let key = catalog_key("Chroma Luger");
        assert_eq!(key, ItemKey::new("luger", true));
        assert!(key.is_chroma());
    }

    #[test]
    fn test_catalog_key_chroma_in_middle_is_not_a_variant() {
        let key = catalog_key("Dark Chroma Blade");
        assert!(!key.is_chroma());
        assert_eq!(key.name(), "dark chroma blade");
    }

    #[test]
    fn test_parse_products_page() {
        let parsed: ProductsPage = serde_json::from_str(
            r#"{"products": [
                {"id": 1, "title": "Luger", "variants": [{"id": 11, "price": "99.50"}]},
                {"id": 2, "title": "Chroma Fang", "variants": [{"id": 21, "price": "250.00"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[0].variants[0].id, 11);
        assert_eq!(
            parsed.products[0].variants[0].price.parse::<Decimal>().unwrap(),
            dec!(99.50)
        );
    }
}
