//! Notification message rendering.
//!
//! Pure functions from diff results to Discord-flavoured markdown, kept
//! free of any transport so they can be unit-tested directly. Messages
//! are chunked to stay under Discord's content length limit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{ChangeKind, PriceChange};

/// Change lines per webhook message.
const CHUNK_SIZE: usize = 5;

/// Header line: role ping, timestamp, change count.
pub fn render_header(changed: usize, role_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "<@&{role_id}> **StarPets Price Changes!** - {}\n**{changed} items changed:**",
        at.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// One line for a price change.
///
/// `store_price` is the target store's current price for the same item
/// (when the catalog was readable this tick); `recommended` is the
/// undercut suggestion. Returns `None` for new/removed entries — those
/// never notify.
pub fn render_change_line(
    change: &PriceChange,
    store_price: Option<Decimal>,
    recommended: Option<Decimal>,
) -> Option<String> {
    let ChangeKind::Changed { old, new } = change.kind else {
        return None;
    };

    let direction = if new > old { "📈" } else { "📉" };
    let chroma_tag = if change.key.is_chroma() { " [CHROMA]" } else { "" };

    let mut line = format!(
        "{direction} **{}{chroma_tag}**\n   SP: ~~${old:.2}~~ → **${new:.2}**",
        change.name,
    );
    if let Some(bb) = store_price {
        line.push_str(&format!(" | BB: ${bb:.2}"));
    }
    if let Some(rec) = recommended {
        line.push_str(&format!("\n   → Set BB to: **${rec:.2}**"));
    }

    Some(line)
}

/// Group change lines into webhook-sized messages.
pub fn chunk_lines(lines: &[String]) -> Vec<String> {
    lines
        .chunks(CHUNK_SIZE)
        .map(|chunk| chunk.join("\n\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKey;
    use rust_decimal_macros::dec;

    fn changed(name: &str, chroma: bool, old: Decimal, new: Decimal) -> PriceChange {
        PriceChange {
            key: ItemKey::new(name, chroma),
            name: name.to_string(),
            kind: ChangeKind::Changed { old, new },
        }
    }

    #[test]
    fn test_header_mentions_role_and_count() {
        let header = render_header(3, "42", Utc::now());
        assert!(header.starts_with("<@&42>"));
        assert!(header.contains("3 items changed"));
    }

    #[test]
    fn test_change_line_drop() {
        let line = render_change_line(
            &changed("Luger", false, dec!(100.00), dec!(95.00)),
            Some(dec!(99.00)),
            Some(dec!(94.05)),
        )
        .unwrap();
        assert!(line.starts_with("📉"));
        assert!(line.contains("~~$100.00~~ → **$95.00**"));
        assert!(line.contains("BB: $99.00"));
        assert!(line.contains("Set BB to: **$94.05**"));
        assert!(!line.contains("[CHROMA]"));
    }

    #[test]
    fn test_change_line_rise_chroma() {
        let line = render_change_line(
            &changed("Fang", true, dec!(30.00), dec!(35.00)),
            None,
            None,
        )
        .unwrap();
        assert!(line.starts_with("📈"));
        assert!(line.contains("[CHROMA]"));
        assert!(!line.contains("BB:"));
        assert!(!line.contains("Set BB"));
    }

    #[test]
    fn test_non_changed_entries_render_nothing() {
        let new_item = PriceChange {
            key: ItemKey::new("luger", false),
            name: "Luger".into(),
            kind: ChangeKind::New { price: dec!(99.00) },
        };
        assert!(render_change_line(&new_item, None, None).is_none());

        let removed = PriceChange {
            key: ItemKey::new("luger", false),
            name: "Luger".into(),
            kind: ChangeKind::Removed {
                last_price: dec!(99.00),
            },
        };
        assert!(render_change_line(&removed, None, None).is_none());
    }

    #[test]
    fn test_chunking() {
        let lines: Vec<String> = (0..12).map(|i| format!("line {i}")).collect();
        let chunks = chunk_lines(&lines);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].matches("line").count(), 5);
        assert_eq!(chunks[2].matches("line").count(), 2);
        assert!(chunk_lines(&[]).is_empty());
    }
}
