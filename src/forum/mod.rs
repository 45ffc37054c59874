//! Client for a Discourse forum's read-only JSON API.

mod models;

pub use models::*;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::constants::USER_AGENT;

/// Why a forum request produced no data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The forum could not be reached or answered with a non-success status.
    #[error("forum unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The forum answered, but the body was not the expected JSON.
    #[error("malformed forum response: {0}")]
    MalformedResponse(String),
}

/// Source of forum topics.
#[async_trait]
pub trait ForumSource: Send + Sync {
    /// List the forum's most recently active topics.
    async fn list_recent_topics(&self) -> Result<Vec<TopicSummary>, FetchError>;

    /// Fetch a topic with its post stream.
    async fn fetch_topic(&self, topic_id: i64) -> Result<TopicDetail, FetchError>;

    /// Public URL of a topic page.
    fn topic_url(&self, slug: &str, topic_id: i64) -> String;
}

/// [`ForumSource`] backed by a live Discourse instance.
#[derive(Debug, Clone)]
pub struct DiscourseClient {
    client: reqwest::Client,
    base_url: String,
}

impl DiscourseClient {
    /// Build a client for the forum at `config.forum_base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client, &config.forum_base_url))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Fetching forum JSON");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::UpstreamUnavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "GET {url} returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::UpstreamUnavailable(format!("GET {url}: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("GET {url}: {e}")))
    }
}

#[async_trait]
impl ForumSource for DiscourseClient {
    async fn list_recent_topics(&self) -> Result<Vec<TopicSummary>, FetchError> {
        let latest: LatestResponse = self.get_json("/latest.json").await?;
        Ok(latest.topic_list.topics)
    }

    async fn fetch_topic(&self, topic_id: i64) -> Result<TopicDetail, FetchError> {
        self.get_json(&format!("/t/{topic_id}.json")).await
    }

    fn topic_url(&self, slug: &str, topic_id: i64) -> String {
        format!("{}/t/{slug}/{topic_id}", self.base_url)
    }
}
