//! The price monitor tick.
//!
//! `Monitor` owns the client seams and runs one
//! fetch→diff→notify→update→record pass per call. All state carried
//! across ticks lives in the `PriceBook` the caller passes in, so a
//! tick is testable in isolation with fake collaborators.
//!
//! Failure isolation is strict: a fetch failure aborts the tick before
//! anything else happens (the book is untouched); notify and update
//! failures are logged and never stop the tick from committing the
//! fresh fetch as the new book.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::engine::{diff, pricing};
use crate::notify::{message, Notifier};
use crate::platforms::{CatalogStore, PriceSource};
use crate::types::{CatalogEntry, ChangeKind, ItemKey, PriceBook, PriceChange, TickReport};

/// Pause between consecutive webhook posts.
const POST_DELAY_MS: u64 = 500;

/// Tick settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Role mentioned in the notification header.
    pub role_id: String,
    /// Fraction subtracted from the source price for the target store.
    pub undercut_fraction: Decimal,
}

/// Runs the tick pipeline against the configured collaborators.
pub struct Monitor {
    source: Box<dyn PriceSource>,
    notifier: Box<dyn Notifier>,
    /// `None` when no target-store credentials are configured; the
    /// update step is then skipped entirely.
    catalog: Option<Box<dyn CatalogStore>>,
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(
        source: Box<dyn PriceSource>,
        notifier: Box<dyn Notifier>,
        catalog: Option<Box<dyn CatalogStore>>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            catalog,
            settings,
        }
    }

    /// Run one tick. `book` is the last-observed state; on success it
    /// holds the fresh fetch, on error it is untouched.
    pub async fn run_tick(&self, book: &mut PriceBook) -> Result<TickReport> {
        let mut report = TickReport::empty(Utc::now());

        // 1. Fetch. The only step whose failure aborts the tick.
        let listings = self
            .source
            .fetch_listings()
            .await
            .with_context(|| format!("Fetch from {} failed", self.source.name()))?;
        report.items_fetched = listings.len();

        // 2. Diff against the recorded book.
        let changes = diff::compute_diff(book, &listings);
        for change in &changes {
            match change.kind {
                ChangeKind::New { .. } => report.new_items += 1,
                ChangeKind::Removed { .. } => report.removed_items += 1,
                ChangeKind::Changed { .. } => report.changed_items += 1,
            }
        }

        let changed: Vec<&PriceChange> = changes.iter().filter(|c| c.is_changed()).collect();

        if changed.is_empty() {
            debug!(fetched = report.items_fetched, "No price changes");
        } else {
            info!(count = changed.len(), "Price changes detected");

            // Catalog context is shared by the notification (current
            // store prices) and the update step (variant IDs).
            let catalog_index = self.fetch_catalog_index().await;

            // 3. Notify, best-effort.
            report.notified = self.notify_changes(&changed, catalog_index.as_ref()).await;

            // 4. Update the target store, best-effort per item.
            if let (Some(store), Some(index)) = (&self.catalog, catalog_index.as_ref()) {
                let (attempted, applied) = self.apply_updates(store.as_ref(), &changed, index).await;
                report.updates_attempted = attempted;
                report.updates_applied = applied;
            }
        }

        for change in &changes {
            if let ChangeKind::Removed { last_price } = change.kind {
                info!(item = %change.key, last_price = %last_price, "Item delisted");
            }
        }

        // 5. Record. Commits regardless of notify/update outcomes.
        book.replace_all(&listings);

        Ok(report)
    }

    /// Fetch and index the target-store catalog, when one is configured.
    /// A failure here downgrades the tick (no updates, no store prices
    /// in the message) but doesn't stop it.
    async fn fetch_catalog_index(&self) -> Option<HashMap<ItemKey, CatalogEntry>> {
        let store = self.catalog.as_ref()?;
        match store.fetch_catalog().await {
            Ok(entries) => Some(
                entries
                    .into_iter()
                    .map(|e| (e.key.clone(), e))
                    .collect(),
            ),
            Err(e) => {
                warn!(store = store.name(), error = %e, "Catalog fetch failed — skipping updates this tick");
                None
            }
        }
    }

    /// Render and deliver the change notification. Returns whether every
    /// message went through.
    async fn notify_changes(
        &self,
        changed: &[&PriceChange],
        catalog_index: Option<&HashMap<ItemKey, CatalogEntry>>,
    ) -> bool {
        let lines: Vec<String> = changed
            .iter()
            .filter_map(|change| {
                let store_price = catalog_index
                    .and_then(|index| index.get(&change.key))
                    .map(|entry| entry.price);
                let recommended = change
                    .new_price()
                    .map(|p| pricing::undercut_price(p, self.settings.undercut_fraction));
                message::render_change_line(change, store_price, recommended)
            })
            .collect();

        let header = message::render_header(changed.len(), &self.settings.role_id, Utc::now());
        let mut messages = vec![header];
        messages.extend(message::chunk_lines(&lines));

        let mut all_delivered = true;
        for (i, content) in messages.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(POST_DELAY_MS)).await;
            }
            if let Err(e) = self.notifier.post(content).await {
                warn!(error = %e, "Webhook delivery failed");
                all_delivered = false;
            }
        }
        all_delivered
    }

    /// Write undercut prices for every changed item with a catalog match.
    /// Returns (attempted, applied).
    async fn apply_updates(
        &self,
        store: &dyn CatalogStore,
        changed: &[&PriceChange],
        catalog_index: &HashMap<ItemKey, CatalogEntry>,
    ) -> (usize, usize) {
        let mut attempted = 0;
        let mut applied = 0;

        for change in changed {
            let Some(new_price) = change.new_price() else {
                continue;
            };
            let Some(entry) = catalog_index.get(&change.key) else {
                debug!(item = %change.key, "No catalog match — nothing to update");
                continue;
            };

            let target = pricing::undercut_price(new_price, self.settings.undercut_fraction);
            attempted += 1;
            match store.update_price(entry.variant_id, target).await {
                Ok(()) => {
                    applied += 1;
                    info!(
                        item = %change.key,
                        variant_id = entry.variant_id,
                        price = %target,
                        "Store price updated"
                    );
                }
                Err(e) => {
                    warn!(item = %change.key, error = %e, "Store update failed");
                }
            }
        }

        (attempted, applied)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
