//! Storefront integrations.
//!
//! Defines the client seams the tick pipeline depends on and provides
//! implementations for:
//! - StarPets (MM2 market API) — read-only price source
//! - Shopify — target-store catalog read + authenticated price updates

pub mod shopify;
pub mod starpets;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{CatalogEntry, Listing};

/// Read-only price source: the storefront being watched.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current listings for all tracked items.
    async fn fetch_listings(&self) -> Result<Vec<Listing>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// The storefront whose prices get rewritten.
///
/// Reads the public catalog to map item keys to variants, and writes
/// new prices through the admin API.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch the store's current catalog.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>>;

    /// Set a new price on a catalog variant.
    async fn update_price(&self, variant_id: u64, price: Decimal) -> Result<()>;

    /// Store name for logging.
    fn name(&self) -> &str;
}
