//! Undercut pricing.

use rust_decimal::{Decimal, RoundingStrategy};

/// Compute the target-store price: `price * (1 - fraction)`, rounded
/// half-up (midpoint away from zero) to the cent.
///
/// The fraction is validated at config load, so this assumes `[0, 1)`.
pub fn undercut_price(price: Decimal, fraction: Decimal) -> Decimal {
    (price * (Decimal::ONE - fraction))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
