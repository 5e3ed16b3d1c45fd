use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::Encyclopedia;
use crate::config::WikipediaConfig;
use crate::error::{LaiserError, LaiserResult};

/// MediaWiki action API client returning plain-text page introductions.
pub struct Wikipedia {
    client: Client,
    api_url: String,
}

impl Wikipedia {
    pub fn new(client: Client, config: &WikipediaConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
        }
    }
}

#[async_trait]
impl Encyclopedia for Wikipedia {
    async fn extract(&self, title: &str) -> LaiserResult<Option<String>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("format", "json"),
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", ""),
                ("explaintext", ""),
                ("redirects", "1"),
                ("titles", title),
            ])
            .send()
            .await
            .map_err(|e| LaiserError::network(&self.api_url, e))?;

        if !response.status().is_success() {
            return Err(LaiserError::status(&self.api_url, response.status()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LaiserError::network(&self.api_url, e))?;

        Ok(first_extract(&json))
    }
}

/// The `extract` of the first page in a `query.pages` response.
pub fn first_extract(json: &Value) -> Option<String> {
    json["query"]["pages"]
        .as_object()?
        .values()
        .next()?
        .get("extract")?
        .as_str()
        .map(str::to_string)
}
