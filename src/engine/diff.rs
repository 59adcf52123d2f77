//! Price diffing.
//!
//! Compares the recorded book against a fresh fetch and classifies every
//! item as new, removed, or changed. Prices are normalized to 2 dp
//! `Decimal` on ingest, so "changed" is an exact comparison — any
//! non-zero difference counts.

use crate::types::{ChangeKind, Listing, PriceBook, PriceChange};

/// Compute the diff between the recorded book and the latest listings.
///
/// Unchanged items produce no entry. Ordering follows the listings
/// slice for new/changed entries, with removals appended after.
pub fn compute_diff(book: &PriceBook, listings: &[Listing]) -> Vec<PriceChange> {
    let mut changes = Vec::new();

    for listing in listings {
        match book.price_of(&listing.key) {
            None => changes.push(PriceChange {
                key: listing.key.clone(),
                name: listing.name.clone(),
                kind: ChangeKind::New {
                    price: listing.price,
                },
            }),
            Some(old) if old != listing.price => changes.push(PriceChange {
                key: listing.key.clone(),
                name: listing.name.clone(),
                kind: ChangeKind::Changed {
                    old,
                    new: listing.price,
                },
            }),
            Some(_) => {}
        }
    }

    for (key, observed) in book.iter() {
        if !listings.iter().any(|l| &l.key == key) {
            changes.push(PriceChange {
                key: key.clone(),
                name: observed.name.clone(),
                kind: ChangeKind::Removed {
                    last_price: observed.price,
                },
            });
        }
    }

    changes
}
