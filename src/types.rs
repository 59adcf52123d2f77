//! Core domain types for pricewatch.
//!
//! Everything the tick pipeline passes around lives here: source-market
//! listings, the in-memory price book, diff results, the per-tick report,
//! and the domain error taxonomy.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Item rarity tier on the source market.
///
/// Only these tiers are tracked; anything else the market returns
/// (common, uncommon, rare) is dropped on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rarity {
    Godly,
    Ancient,
    Vintage,
    Legendary,
    Chroma,
}

impl Rarity {
    pub const TRACKED: [Rarity; 5] = [
        Rarity::Godly,
        Rarity::Ancient,
        Rarity::Vintage,
        Rarity::Legendary,
        Rarity::Chroma,
    ];
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rarity::Godly => "godly",
            Rarity::Ancient => "ancient",
            Rarity::Vintage => "vintage",
            Rarity::Legendary => "legendary",
            Rarity::Chroma => "chroma",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Rarity {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "godly" => Ok(Rarity::Godly),
            "ancient" => Ok(Rarity::Ancient),
            "vintage" => Ok(Rarity::Vintage),
            "legendary" => Ok(Rarity::Legendary),
            "chroma" => Ok(Rarity::Chroma),
            other => Err(WatchError::Config(format!("unknown rarity: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Item identity
// ---------------------------------------------------------------------------

/// Normalized identity of a tracked item.
///
/// The source market lists the chroma variant of a weapon as a separate
/// item with the same name, so identity is (lowercased name, chroma flag).
/// This is also how target-store catalog entries are matched back to
/// source listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    name: String,
    chroma: bool,
}

impl ItemKey {
    pub fn new(name: &str, chroma: bool) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            chroma,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_chroma(&self) -> bool {
        self.chroma
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = if self.chroma { "chroma" } else { "regular" };
        write!(f, "{}|{variant}", self.name)
    }
}

// ---------------------------------------------------------------------------
// Listings and the price book
// ---------------------------------------------------------------------------

/// One item as fetched from the source market in a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub key: ItemKey,
    /// Display name as the market shows it (original casing).
    pub name: String,
    pub rarity: Rarity,
    /// USD price, normalized to 2 decimal places on ingest.
    pub price: Decimal,
}

/// Last successfully observed price for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedPrice {
    pub name: String,
    pub price: Decimal,
}

/// In-memory map of last-observed prices, keyed by item identity.
///
/// This is the only state carried across ticks. It always holds the most
/// recent successful fetch as a whole — `replace_all` is the tick path's
/// single mutation point, so a failed tick can never leave a mixed book.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    items: HashMap<ItemKey, ObservedPrice>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, key: &ItemKey) -> Option<&ObservedPrice> {
        self.items.get(key)
    }

    pub fn price_of(&self, key: &ItemKey) -> Option<Decimal> {
        self.items.get(key).map(|o| o.price)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, &ObservedPrice)> {
        self.items.iter()
    }

    /// Commit a whole fetch as the new book. Items absent from
    /// `listings` are dropped.
    pub fn replace_all(&mut self, listings: &[Listing]) {
        self.items = listings
            .iter()
            .map(|l| {
                (
                    l.key.clone(),
                    ObservedPrice {
                        name: l.name.clone(),
                        price: l.price,
                    },
                )
            })
            .collect();
    }

    /// Insert a single observation. For seeding and test setup; the tick
    /// path goes through `replace_all`.
    pub fn record(&mut self, key: ItemKey, observed: ObservedPrice) {
        self.items.insert(key, observed);
    }
}

// ---------------------------------------------------------------------------
// Target-store catalog
// ---------------------------------------------------------------------------

/// One product on the target store, mapped back to a source item key.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub key: ItemKey,
    /// Product title as listed on the store.
    pub title: String,
    pub product_id: u64,
    /// Variant whose price the admin API updates.
    pub variant_id: u64,
    /// Current listed price.
    pub price: Decimal,
}

// ---------------------------------------------------------------------------
// Diff results
// ---------------------------------------------------------------------------

/// How an item moved between the recorded book and the latest fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// No recorded price — baseline, recorded silently.
    New { price: Decimal },
    /// Present in the book, absent from the fetch.
    Removed { last_price: Decimal },
    /// Recorded and fetched prices differ.
    Changed { old: Decimal, new: Decimal },
}

/// One entry of a tick's diff.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub key: ItemKey,
    pub name: String,
    pub kind: ChangeKind,
}

impl PriceChange {
    pub fn is_changed(&self) -> bool {
        matches!(self.kind, ChangeKind::Changed { .. })
    }

    /// The freshly fetched price, when there is one this tick.
    pub fn new_price(&self) -> Option<Decimal> {
        match self.kind {
            ChangeKind::New { price } => Some(price),
            ChangeKind::Changed { new, .. } => Some(new),
            ChangeKind::Removed { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// Summary of a single fetch→diff→notify→update→record tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub items_fetched: usize,
    pub new_items: usize,
    pub removed_items: usize,
    pub changed_items: usize,
    /// Whether a webhook notification was delivered this tick.
    pub notified: bool,
    pub updates_attempted: usize,
    pub updates_applied: usize,
}

impl TickReport {
    pub fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            items_fetched: 0,
            new_items: 0,
            removed_items: 0,
            changed_items: 0,
            notified: false,
            updates_attempted: 0,
            updates_applied: 0,
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} new={} removed={} changed={} notified={} updates={}/{}",
            self.items_fetched,
            self.new_items,
            self.removed_items,
            self.changed_items,
            self.notified,
            self.updates_applied,
            self.updates_attempted,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error taxonomy.
///
/// Fetch, notify, and update failures are local to a tick and never fatal;
/// config errors terminate startup.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error ({source_name}): {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("Update error ({item}): {message}")]
    Update { item: String, message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
