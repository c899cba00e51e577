//! The article type shared by the feed controller, the worker and the UI.
//!
//! The backend returns loosely-shaped JSON documents straight out of its
//! article collection.  Nothing past this module sees that JSON: responses
//! are decoded into [`WireArticle`] and validated into [`Article`] here, and
//! any body that does not decode is a fetch failure.
//!
//! ## For contributors
//!
//! If the backend grows a new field you want to display, add it to
//! [`WireArticle`] as an `Option` (older documents will not carry it) and
//! copy it across in [`Article::from_wire`].

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// A single news article, normalised from the backend's JSON.
///
/// Immutable once decoded.  Identity is [`link`](Article::link): two
/// articles with the same link are the same article, whatever their other
/// fields say.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Canonical URL of the article.  Used for de-duplication.
    pub link: String,

    /// Headline.
    pub title: String,

    /// Summary as published by the upstream feed.  Usually HTML.
    pub summary: String,

    /// Publisher label, e.g. "Business Recorder".
    pub source: String,

    /// Publication time.  `None` when the backend sent nothing parseable.
    pub published: Option<DateTime<Utc>>,

    /// Sector tag assigned by the backend's classifier.
    pub category: Option<String>,

    /// Relevance to local business, 1-10, assigned by the classifier.
    pub relevance_score: Option<f64>,
}

/// An article exactly as it arrives on the wire.
///
/// Every field is optional so that one sparse document does not fail the
/// whole page; [`Article::from_wire`] decides what is acceptable.
#[derive(Debug, Default, Deserialize)]
pub struct WireArticle {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Free-form date string copied from the upstream RSS entry.
    #[serde(default)]
    pub published: Option<String>,
    /// The backend's own normalised timestamp (naive, UTC).
    #[serde(default)]
    pub published_date: Option<String>,
    /// Classifier output is stored verbatim by the backend, so these two
    /// may arrive with any JSON type.
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub relevance_score: Option<f64>,
}

/// A string, or a number rendered as one.  Anything else is `None`.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A finite number, or a string holding one.  Anything else is `None`.
fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score.filter(|f| f.is_finite()))
}

impl Article {
    /// Validate a wire document.  Returns `None` when it has no usable link,
    /// since such an article can be neither de-duplicated nor opened.
    pub fn from_wire(wire: WireArticle) -> Option<Self> {
        let link = wire.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;

        let published = parse_published(wire.published.as_deref())
            .or_else(|| parse_published(wire.published_date.as_deref()));

        Some(Self {
            link,
            title: wire
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "(untitled)".into()),
            summary: wire.summary.unwrap_or_default(),
            source: wire.source.unwrap_or_else(|| "Unknown".into()),
            published,
            category: wire.category,
            relevance_score: wire.relevance_score,
        })
    }

    /// Render the HTML summary as wrapped plain text.
    pub fn summary_text(&self, width: usize) -> String {
        if self.summary.trim().is_empty() {
            return String::new();
        }
        html2text::from_read(self.summary.as_bytes(), width.max(10))
    }
}

/// Decode a `GET /news` response body into validated articles.
///
/// The body must be a JSON array of objects; anything else is an error.
/// Individual documents without a link are dropped with a warning.
pub fn decode_articles(body: &[u8]) -> Result<Vec<Article>> {
    let wire: Vec<WireArticle> =
        serde_json::from_slice(body).context("news response is not an array of articles")?;
    let total = wire.len();

    let articles: Vec<Article> = wire.into_iter().filter_map(Article::from_wire).collect();

    if articles.len() < total {
        warn!(
            dropped = total - articles.len(),
            "skipped articles without a link"
        );
    }
    Ok(articles)
}

/// Best-effort timestamp parsing.
///
/// Upstream feeds use RFC 2822 (`Mon, 01 Jan 2024 00:00:00 +0000`), the
/// backend serialises its own dates as naive ISO 8601, and some sources send
/// RFC 3339.  Naive times are taken to be UTC.
fn parse_published(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
