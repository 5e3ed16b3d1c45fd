//! Search, news and encyclopedia lookups.
//!
//! The transports live behind [`SearchProvider`] and [`Encyclopedia`]; the
//! [`Providers`] adapter wraps them so that a failing provider degrades to an
//! empty list or a placeholder summary instead of aborting the query, and so
//! that every URL it obtains lands in the request's [`SourceLinks`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Settings;
use crate::error::{LaiserError, LaiserResult};
use crate::sources::SourceLinks;

pub mod duckduckgo;
pub mod wikipedia;

pub use duckduckgo::DuckDuckGo;
pub use wikipedia::Wikipedia;

pub const NO_WIKIPEDIA_HIT: &str = "No Wikipedia summary available.";
pub const NO_SUMMARY: &str = "No summary available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub summary: String,
}

impl SummaryRecord {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> LaiserResult<Vec<SearchRecord>>;

    async fn news(&self, query: &str, limit: usize) -> LaiserResult<Vec<NewsRecord>>;
}

#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Plain-text introduction of the page titled `title`, if the page has one.
    async fn extract(&self, title: &str) -> LaiserResult<Option<String>>;
}

pub(crate) fn build_client(settings: &Settings) -> LaiserResult<Client> {
    Client::builder()
        .timeout(settings.search.request_timeout())
        .user_agent(&settings.search.user_agent)
        .build()
        .map_err(|e| LaiserError::network("client builder", e))
}

pub struct Providers {
    search: Box<dyn SearchProvider>,
    encyclopedia: Box<dyn Encyclopedia>,
    trim_lines: Option<usize>,
}

impl Providers {
    pub fn new(
        search: Box<dyn SearchProvider>,
        encyclopedia: Box<dyn Encyclopedia>,
        trim_lines: Option<usize>,
    ) -> Self {
        Self {
            search,
            encyclopedia,
            trim_lines,
        }
    }

    pub fn from_settings(settings: &Settings) -> LaiserResult<Self> {
        let client = build_client(settings)?;
        let trim_lines = settings
            .search
            .trim_wikipedia_summary
            .then_some(settings.search.trim_wikipedia_lines);

        Ok(Self::new(
            Box::new(DuckDuckGo::new(client.clone(), &settings.duckduckgo)),
            Box::new(Wikipedia::new(client, &settings.wikipedia)),
            trim_lines,
        ))
    }

    pub async fn web(&self, query: &str, limit: usize, links: &mut SourceLinks) -> Vec<SearchRecord> {
        match self.search.search(query, limit).await {
            Ok(mut records) => {
                records.truncate(limit);
                for record in &records {
                    links.push(record.url.as_str());
                }
                log::debug!("web search for {:?} returned {} results", query, records.len());
                records
            }
            Err(e) => {
                log::warn!("web search failed: {}", e.to_user_message());
                Vec::new()
            }
        }
    }

    pub async fn news(&self, query: &str, limit: usize, links: &mut SourceLinks) -> Vec<NewsRecord> {
        match self.search.news(query, limit).await {
            Ok(mut records) => {
                records.truncate(limit);
                for record in &records {
                    links.push(record.url.as_str());
                }
                log::debug!("news search for {:?} returned {} results", query, records.len());
                records
            }
            Err(e) => {
                log::warn!("news search failed: {}", e.to_user_message());
                Vec::new()
            }
        }
    }

    /// Locates the Wikipedia article for `query` through a site-restricted web
    /// search and returns its (optionally trimmed) introduction.
    pub async fn wikipedia(&self, query: &str, links: &mut SourceLinks) -> SummaryRecord {
        let hits = self
            .web(&format!("site:wikipedia.org {query}"), 1, links)
            .await;

        let Some(hit) = hits.into_iter().next() else {
            return SummaryRecord::new(NO_WIKIPEDIA_HIT);
        };
        links.push(hit.url.as_str());

        let Some(title) = page_title_from_url(&hit.url) else {
            log::warn!("could not derive a page title from {}", hit.url);
            return SummaryRecord::new(NO_SUMMARY);
        };

        match self.encyclopedia.extract(&title).await {
            Ok(Some(text)) => match self.trim_lines {
                Some(lines) => SummaryRecord::new(trim_summary(&text, lines)),
                None => SummaryRecord::new(text),
            },
            Ok(None) => SummaryRecord::new(NO_SUMMARY),
            Err(e) => {
                log::warn!("wikipedia lookup for {:?} failed: {}", title, e.to_user_message());
                SummaryRecord::new(NO_SUMMARY)
            }
        }
    }
}

/// Last path segment of `url`, percent-decoded.
pub fn page_title_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}

/// Keeps the first `lines` period-delimited fragments of `text`.
///
/// Every literal `.` counts as a sentence end, so abbreviations and decimals
/// cut the summary short.
pub fn trim_summary(text: &str, lines: usize) -> String {
    let mut trimmed = text
        .split('.')
        .take(lines)
        .collect::<Vec<_>>()
        .join(".")
        .trim_end()
        .to_string();
    if !trimmed.ends_with('.') {
        trimmed.push('.');
    }
    trimmed
}
