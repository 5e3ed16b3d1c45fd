//! DuckDuckGo web and news search.
//!
//! Web results come from the HTML-only endpoint; news comes from the
//! `news.js` JSON endpoint, which needs a `vqd` token scraped from the
//! regular search page first.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use super::{NewsRecord, SearchProvider, SearchRecord};
use crate::config::DuckDuckGoConfig;
use crate::error::{LaiserError, LaiserResult};

lazy_static! {
    static ref VQD: Regex = Regex::new(r#"vqd=["']?([\d-]+)"#).unwrap();
}

pub struct DuckDuckGo {
    client: Client,
    html_url: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    source: String,
}

impl DuckDuckGo {
    pub fn new(client: Client, config: &DuckDuckGoConfig) -> Self {
        Self {
            client,
            html_url: config.html_url.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(&self, url: &str, params: &[(&str, &str)]) -> LaiserResult<String> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| LaiserError::network(url, e))?;

        if !response.status().is_success() {
            return Err(LaiserError::status(url, response.status()));
        }

        response.text().await.map_err(|e| LaiserError::network(url, e))
    }

    async fn fetch_vqd(&self, query: &str) -> LaiserResult<String> {
        let url = format!("{}/", self.base_url);
        let page = self.get_text(&url, &[("q", query)]).await?;
        extract_vqd(&page).ok_or_else(|| LaiserError::parse(url, "vqd token not found"))
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    async fn search(&self, query: &str, limit: usize) -> LaiserResult<Vec<SearchRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.html_url)
            .form(&[("q", query)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| LaiserError::network(&self.html_url, e))?;

        if !response.status().is_success() {
            return Err(LaiserError::status(&self.html_url, response.status()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| LaiserError::network(&self.html_url, e))?;
        log::debug!("duckduckgo html response: {} bytes", html.len());

        parse_results_html(&html, limit)
    }

    async fn news(&self, query: &str, limit: usize) -> LaiserResult<Vec<NewsRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let vqd = self.fetch_vqd(query).await?;
        let url = format!("{}/news.js", self.base_url);
        let body = self
            .get_text(
                &url,
                &[
                    ("l", "wt-wt"),
                    ("o", "json"),
                    ("noamp", "1"),
                    ("q", query),
                    ("vqd", vqd.as_str()),
                ],
            )
            .await?;

        parse_news_json(&body, limit)
    }
}

pub fn extract_vqd(page: &str) -> Option<String> {
    VQD.captures(page).map(|caps| caps[1].to_string())
}

/// Unwraps `//duckduckgo.com/l/?uddg=<encoded>` redirect links.
pub fn clean_result_url(href: &str) -> Option<String> {
    let full_href = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&full_href).ok()?;
    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
    } else if parsed.scheme().starts_with("http") {
        Some(full_href)
    } else {
        None
    }
}

fn selector(css: &str) -> LaiserResult<Selector> {
    Selector::parse(css).map_err(|e| LaiserError::parse(css, format!("{e:?}")))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_results_html(html: &str, limit: usize) -> LaiserResult<Vec<SearchRecord>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result:not(.result--ad)")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        if results.len() >= limit {
            break;
        }

        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let title = collapse_whitespace(&title_el.text().collect::<String>());
        if title.is_empty() {
            continue;
        }

        let Some(url) = title_el.value().attr("href").and_then(clean_result_url) else {
            continue;
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();

        results.push(SearchRecord {
            title,
            url,
            snippet,
        });
    }

    Ok(results)
}

/// Strips markup such as `<b>` highlights and decodes entities.
fn html_to_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    collapse_whitespace(&parsed.root_element().text().collect::<String>())
}

pub fn parse_news_json(body: &str, limit: usize) -> LaiserResult<Vec<NewsRecord>> {
    let response: NewsResponse =
        serde_json::from_str(body).map_err(|e| LaiserError::parse("news.js", e))?;

    Ok(response
        .results
        .into_iter()
        .filter(|item| !item.url.is_empty())
        .take(limit)
        .map(|item| NewsRecord {
            title: html_to_text(&item.title),
            url: item.url,
            snippet: html_to_text(&item.excerpt),
            source: item.source,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuckDuckGoConfig;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<div class="result results_links results_links_deep web-result result--ad">
    <a class="result__a" href="https://ads.example/">Sponsored</a>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FClimate_change&amp;rut=abc">
        Climate change - Wikipedia
    </a>
    <a class="result__snippet">Climate change is the long-term
        shift in temperatures.</a>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://www.un.org/climatechange">What Is Climate Change?</a>
</div>
<div class="result results_links results_links_deep web-result">
    <a class="result__a" href="https://third.example/">Third</a>
    <a class="result__snippet">third</a>
</div>
</body></html>"#;

    const NEWS_JSON: &str = r#"{"results": [
        {"title": "Heat <b>records</b> broken", "url": "https://news.example/heat",
         "excerpt": "Scientists &amp; officials warn", "source": "Example News", "date": 1700000000},
        {"title": "No link", "url": "", "excerpt": "", "source": "x"},
        {"title": "Second", "url": "https://news.example/second", "excerpt": "more", "source": "Other"}
    ]}"#;

    #[test]
    fn parses_results_skipping_ads_and_unwrapping_redirects() {
        let results = parse_results_html(RESULTS_HTML, 10).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Climate change - Wikipedia");
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Climate_change");
        assert_eq!(
            results[0].snippet,
            "Climate change is the long-term shift in temperatures."
        );
        assert_eq!(results[1].url, "https://www.un.org/climatechange");
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn parse_results_respects_limit() {
        assert_eq!(parse_results_html(RESULTS_HTML, 1).unwrap().len(), 1);
        assert!(parse_results_html(RESULTS_HTML, 0).unwrap().is_empty());
        assert!(parse_results_html("<html></html>", 5).unwrap().is_empty());
    }

    #[test]
    fn clean_result_url_variants() {
        assert_eq!(
            clean_result_url("/l/?uddg=https%3A%2F%2Fexample.com%2Fa").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            clean_result_url("https://example.com/direct").as_deref(),
            Some("https://example.com/direct")
        );
        assert_eq!(clean_result_url("javascript:void(0)"), None);
    }

    #[test]
    fn extracts_vqd_token() {
        assert_eq!(
            extract_vqd(r#"<script>vqd="4-1234567890",foo</script>"#).as_deref(),
            Some("4-1234567890")
        );
        assert_eq!(extract_vqd("...&vqd=4-42&p=1").as_deref(), Some("4-42"));
        assert_eq!(extract_vqd("nothing here"), None);
    }

    #[test]
    fn parses_news_and_strips_markup() {
        let news = parse_news_json(NEWS_JSON, 10).unwrap();

        assert_eq!(news.len(), 2);
        assert_eq!(news[0].title, "Heat records broken");
        assert_eq!(news[0].snippet, "Scientists & officials warn");
        assert_eq!(news[0].source, "Example News");
        assert_eq!(news[1].url, "https://news.example/second");
        assert_eq!(parse_news_json(NEWS_JSON, 1).unwrap().len(), 1);
        assert!(parse_news_json("not json", 3).is_err());
    }

    fn engine_for(server: &MockServer) -> DuckDuckGo {
        let config = DuckDuckGoConfig {
            html_url: format!("{}/html/", server.uri()),
            base_url: server.uri(),
        };
        DuckDuckGo::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn search_posts_query_to_html_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .and(body_string_contains("q=climate+change"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_HTML))
            .expect(1)
            .mount(&server)
            .await;

        let results = engine_for(&server).search("climate change", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn search_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = engine_for(&server).search("q", 2).await.unwrap_err();
        assert!(matches!(err, LaiserError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn news_fetches_token_then_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "climate change"))
            .respond_with(ResponseTemplate::new(200).set_body_string("vqd='4-777'"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news.js"))
            .and(query_param("vqd", "4-777"))
            .and(query_param("o", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NEWS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let news = engine_for(&server).news("climate change", 5).await.unwrap();
        assert_eq!(news.len(), 2);
    }

    #[tokio::test]
    async fn news_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = engine_for(&server).news("q", 5).await.unwrap_err();
        assert!(matches!(err, LaiserError::Parse { .. }));
    }
}
