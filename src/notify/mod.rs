//! Change notifications.
//!
//! `message` renders change reports into Discord-flavoured markdown;
//! `discord` delivers them to a webhook. The `Notifier` trait is the
//! seam between the two, so the tick pipeline can be tested with a
//! recording fake.

pub mod discord;
pub mod message;

use anyhow::Result;
use async_trait::async_trait;

/// Fire-and-forget message sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. Non-2xx responses are errors.
    async fn post(&self, content: &str) -> Result<()>;
}
