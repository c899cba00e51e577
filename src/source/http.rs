//! REST implementation of [`NewsBackend`].
//!
//! Uses reqwest's blocking client: every call happens on the worker thread,
//! never on the UI thread, so there is nothing to gain from an async stack.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info};

use super::{decode_articles, decode_stats, Article, NewsBackend, NewsQuery, NewsStats};
use crate::config::ApiConfig;

/// Client for the news endpoints of the market-intelligence backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Body of `GET /news/fetch`.
#[derive(Debug, Deserialize)]
struct FetchSummary {
    #[serde(default)]
    message: String,
}

impl HttpBackend {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(api.timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token: api.token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let req = self.client.get(self.endpoint(path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send, then turn any non-2xx status into an error carrying the body.
    fn send(req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = req.send().with_context(|| format!("{what} request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("{what} failed ({status}): {body}");
        }
        Ok(resp)
    }
}

impl NewsBackend for HttpBackend {
    fn list_news(&self, query: &NewsQuery) -> Result<Vec<Article>> {
        debug!(skip = query.skip, limit = query.limit, "GET /news/");
        let req = self.get("/news/").query(query).query(&[("sort", "latest")]);
        let body = Self::send(req, "GET /news")?
            .bytes()
            .context("failed to read news response")?;
        decode_articles(&body)
    }

    fn stats(&self) -> Result<NewsStats> {
        let body = Self::send(self.get("/news/stats"), "GET /news/stats")?
            .bytes()
            .context("failed to read stats response")?;
        decode_stats(&body)
    }

    fn trigger_fetch(&self) -> Result<String> {
        let summary: FetchSummary = Self::send(self.get("/news/fetch"), "GET /news/fetch")?
            .json()
            .context("malformed fetch response")?;
        info!(message = %summary.message, "upstream fetch finished");
        Ok(summary.message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
