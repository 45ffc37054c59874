//! Response shapes of the Discourse JSON API.
//!
//! Only the fields the digest uses are decoded; everything else is ignored.

use serde::Deserialize;

/// Response from `/latest.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestResponse {
    pub topic_list: TopicList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub topics: Vec<TopicSummary>,
}

/// A topic as listed on the "latest" page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub created_at: String,
}

/// Response from `/t/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicDetail {
    #[serde(default)]
    pub category_name: Option<String>,
    pub post_stream: PostStream,
}

impl TopicDetail {
    /// The topic's opening post, if the stream contains any posts.
    #[must_use]
    pub fn first_post(&self) -> Option<&TopicPost> {
        self.post_stream.posts.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostStream {
    #[serde(default)]
    pub posts: Vec<TopicPost>,
}

/// A single post within a topic's post stream.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicPost {
    /// Rendered HTML body.
    pub cooked: String,
    pub username: String,
    pub user_id: i64,
}
