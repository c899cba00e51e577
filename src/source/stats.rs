//! Feed statistics from `GET /news/stats`.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Article counts per publisher.  The UI builds its source-filter options
/// from the keys of [`source_counts`](NewsStats::source_counts).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsStats {
    #[serde(default)]
    pub total_sources: u64,
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub source_counts: BTreeMap<String, u64>,
}

impl NewsStats {
    /// Publisher names in sorted order.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.source_counts.keys().map(String::as_str)
    }
}

pub fn decode_stats(body: &[u8]) -> Result<NewsStats> {
    serde_json::from_slice(body).context("malformed news stats response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_sorts_sources() {
        let stats = decode_stats(
            br#"{"total_sources": 3, "total_articles": 42,
                 "source_counts": {"TechJuice": 10, "Dawn News": 30, "Profit": 2}}"#,
        )
        .unwrap();

        assert_eq!(stats.total_sources, 3);
        assert_eq!(stats.total_articles, 42);
        let names: Vec<&str> = stats.source_names().collect();
        assert_eq!(names, vec!["Dawn News", "Profit", "TechJuice"]);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let stats = decode_stats(b"{}").unwrap();
        assert_eq!(stats, NewsStats::default());
    }

    #[test]
    fn rejects_non_object() {
        assert!(decode_stats(b"[]").is_err());
    }
}
