//! pricewatch — MM2 storefront price monitor.
//!
//! Entry point. Loads configuration from the environment, initialises
//! structured logging, and runs the fetch→diff→notify→update loop on a
//! fixed interval with graceful shutdown.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info};

use pricewatch::config::Config;
use pricewatch::engine::monitor::{Monitor, MonitorSettings};
use pricewatch::notify::discord::DiscordWebhook;
use pricewatch::platforms::shopify::ShopifyClient;
use pricewatch::platforms::starpets::StarPetsClient;
use pricewatch::platforms::CatalogStore;
use pricewatch::types::PriceBook;

const BANNER: &str = r#"
                 _                    _       _
  _ __  _ __(_) ___ _____      ____ _| |_ ___| |__
 | '_ \| '__| |/ __/ _ \ \ /\ / / _` | __/ __| '_ \
 | |_) | |  | | (__|  __/\ V  V / (_| | || (__| | | |
 | .__/|_|  |_|\___\___| \_/\_/ \__,_|\__\___|_| |_|
 |_|
  MM2 Price Monitor — StarPets → Discord → Shopify
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    // Env configuration; a missing webhook URL is the only fatal case.
    let cfg = Config::from_env()?;

    println!("{BANNER}");
    info!(
        interval_secs = cfg.check_interval_secs,
        undercut = %cfg.undercut_fraction,
        role_id = %cfg.role_id,
        auto_update = cfg.shopify.is_some(),
        "pricewatch starting up"
    );

    // -- Wire up the collaborators ---------------------------------------

    let source = StarPetsClient::new()?;
    let notifier = DiscordWebhook::new(cfg.webhook_url.clone())?;

    let catalog: Option<Box<dyn CatalogStore>> = match &cfg.shopify {
        Some(shopify) => {
            info!(store = %shopify.store, "Shopify auto-update armed");
            Some(Box::new(ShopifyClient::new(shopify)?))
        }
        None => {
            info!("Shopify credentials absent — auto-update disabled");
            None
        }
    };

    let monitor = Monitor::new(
        Box::new(source),
        Box::new(notifier),
        catalog,
        MonitorSettings {
            role_id: cfg.role_id.clone(),
            undercut_fraction: cfg.undercut_fraction,
        },
    );

    // The book lives for the process lifetime only; the first tick
    // records the baseline silently.
    let mut book = PriceBook::new();

    // -- Main loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.check_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.check_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    let mut tick_count: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick_count += 1;
                match monitor.run_tick(&mut book).await {
                    Ok(report) => {
                        info!(tick = tick_count, report = %report, "Tick complete");
                    }
                    Err(e) => {
                        // Local to this tick; the book is untouched and
                        // the next interval gets a clean attempt.
                        error!(tick = tick_count, error = %e, "Tick failed — waiting for next interval");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(
        ticks = tick_count,
        tracked_items = book.len(),
        "pricewatch shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pricewatch=info"));

    let json_logging = std::env::var("PRICEWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
