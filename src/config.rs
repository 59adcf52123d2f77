//! Configuration from environment variables.
//!
//! The whole surface is env-style key/value, resolved once at startup
//! (a `.env` file is loaded first when present). The only fatal
//! misconfiguration is a missing webhook URL; the Shopify credentials
//! are optional and merely disable the auto-update step when absent.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::types::WatchError;

/// Default role to mention in change notifications.
const DEFAULT_ROLE_ID: &str = "1468305257757933853";

/// Default poll interval in seconds (5 minutes).
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Default undercut fraction (1% under the source price).
const DEFAULT_UNDERCUT: Decimal = dec!(0.01);

/// Target-store credentials. Both halves are required for the update
/// step to be armed.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Store domain, e.g. `yourstore.myshopify.com`.
    pub store: String,
    /// Admin API access token.
    pub token: String,
}

/// Resolved application configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord-compatible webhook URL (required).
    pub webhook_url: String,
    /// Role ID to mention in notifications.
    pub role_id: String,
    /// `None` disables the target-store update step entirely.
    pub shopify: Option<ShopifyConfig>,
    /// Seconds between ticks.
    pub check_interval_secs: u64,
    /// Fraction subtracted from the source price, in `[0, 1)`.
    pub undercut_fraction: Decimal,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup. Lets tests drive
    /// the parsing and validation without touching the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup("DISCORD_WEBHOOK")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| WatchError::Config("DISCORD_WEBHOOK is not set".into()))?;

        let role_id = lookup("DISCORD_ROLE_ID")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE_ID.to_string());

        let store = lookup("SHOPIFY_STORE").filter(|v| !v.is_empty());
        let token = lookup("SHOPIFY_TOKEN").filter(|v| !v.is_empty());
        let shopify = match (store, token) {
            (Some(store), Some(token)) => Some(ShopifyConfig { store, token }),
            (None, None) => None,
            (Some(_), None) => {
                warn!("SHOPIFY_STORE set without SHOPIFY_TOKEN — auto-update disabled");
                None
            }
            (None, Some(_)) => {
                warn!("SHOPIFY_TOKEN set without SHOPIFY_STORE — auto-update disabled");
                None
            }
        };

        let check_interval_secs = match lookup("CHECK_INTERVAL") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("CHECK_INTERVAL is not a valid integer: {raw}"))?,
            None => DEFAULT_CHECK_INTERVAL_SECS,
        };
        if check_interval_secs == 0 {
            return Err(WatchError::Config("CHECK_INTERVAL must be >= 1".into()).into());
        }

        let undercut_fraction = match lookup("UNDERCUT_PERCENT") {
            Some(raw) => raw
                .parse::<Decimal>()
                .with_context(|| format!("UNDERCUT_PERCENT is not a valid decimal: {raw}"))?,
            None => DEFAULT_UNDERCUT,
        };
        if undercut_fraction < Decimal::ZERO || undercut_fraction >= Decimal::ONE {
            return Err(WatchError::Config(format!(
                "UNDERCUT_PERCENT must be in [0, 1), got {undercut_fraction}"
            ))
            .into());
        }

        Ok(Self {
            webhook_url,
            role_id,
            shopify,
            check_interval_secs,
            undercut_fraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_defaults() {
        let cfg =
            Config::from_lookup(lookup_from(&[("DISCORD_WEBHOOK", "https://example.com/hook")]))
                .unwrap();
        assert_eq!(cfg.webhook_url, "https://example.com/hook");
        assert_eq!(cfg.role_id, DEFAULT_ROLE_ID);
        assert!(cfg.shopify.is_none());
        assert_eq!(cfg.check_interval_secs, 300);
        assert_eq!(cfg.undercut_fraction, dec!(0.01));
    }

    #[test]
    fn test_missing_webhook_is_fatal() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DISCORD_WEBHOOK", "")])).is_err());
    }

    #[test]
    fn test_full_config() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("DISCORD_ROLE_ID", "42"),
            ("SHOPIFY_STORE", "shop.myshopify.com"),
            ("SHOPIFY_TOKEN", "shpat_abc"),
            ("CHECK_INTERVAL", "60"),
            ("UNDERCUT_PERCENT", "0.05"),
        ]))
        .unwrap();
        assert_eq!(cfg.role_id, "42");
        let shopify = cfg.shopify.unwrap();
        assert_eq!(shopify.store, "shop.myshopify.com");
        assert_eq!(shopify.token, "shpat_abc");
        assert_eq!(cfg.check_interval_secs, 60);
        assert_eq!(cfg.undercut_fraction, dec!(0.05));
    }

    #[test]
    fn test_partial_shopify_credentials_disable_update() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("SHOPIFY_STORE", "shop.myshopify.com"),
        ]))
        .unwrap();
        assert!(cfg.shopify.is_none());
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let bad = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("CHECK_INTERVAL", "five"),
        ]));
        assert!(bad.is_err());

        let zero = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("CHECK_INTERVAL", "0"),
        ]));
        assert!(zero.is_err());
    }

    #[test]
    fn test_undercut_bounds() {
        let too_big = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("UNDERCUT_PERCENT", "1.0"),
        ]));
        assert!(too_big.is_err());

        let negative = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("UNDERCUT_PERCENT", "-0.01"),
        ]));
        assert!(negative.is_err());

        let zero = Config::from_lookup(lookup_from(&[
            ("DISCORD_WEBHOOK", "https://example.com/hook"),
            ("UNDERCUT_PERCENT", "0"),
        ]))
        .unwrap();
        assert_eq!(zero.undercut_fraction, Decimal::ZERO);
    }
}
