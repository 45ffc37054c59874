use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Format a timestamp the way it is stored: UTC, millisecond precision, `Z` suffix.
///
/// The fixed width keeps lexical order equal to chronological order, which the
/// day-window and ordering queries rely on.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The opening post of a forum topic, with its generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// Raw HTML as rendered by the forum.
    pub content: String,
    /// Forum-provided excerpt.
    pub summary: Option<String>,
    pub eli5_summary: String,
    pub url: String,
    pub category: Option<String>,
    pub thread_id: i64,
    pub created_at: String,
    pub author_username: String,
    pub author_id: i64,
}

/// Data for inserting a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub eli5_summary: String,
    pub url: String,
    pub category: Option<String>,
    pub thread_id: i64,
    pub created_at: String,
    pub author_username: String,
    pub author_id: i64,
}

/// One synthesized rollup per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Local calendar day, `YYYY-MM-DD`. Unique key, not sent to clients.
    #[serde(skip)]
    #[sqlx(rename = "date")]
    pub day: String,
    /// Local midnight of the day as a UTC timestamp, exposed as `date`.
    #[serde(rename = "date")]
    pub starts_at: String,
    pub summary: String,
    pub post_ids: Json<Vec<i64>>,
    pub unique_authors: Json<Vec<String>>,
    pub created_at: String,
}

/// Data for inserting a new daily summary.
#[derive(Debug, Clone)]
pub struct NewDailySummary {
    pub date: String,
    pub starts_at: String,
    pub summary: String,
    pub post_ids: Vec<i64>,
    pub unique_authors: Vec<String>,
}

/// Per-author rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub username: String,
    pub post_count: i64,
    pub first_post: String,
    pub last_post: String,
    pub categories: Vec<String>,
}

/// Per-day rollup, keyed by the UTC date of `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    pub post_count: i64,
    pub author_count: i64,
}
