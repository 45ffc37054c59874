//! Shared constants used across the application.

/// User agent sent to the forum and the language model API.
pub const USER_AGENT: &str = concat!("forum-digest/", env!("CARGO_PKG_VERSION"));

/// Number of posts returned by the recent-posts endpoint.
pub const RECENT_POSTS_LIMIT: i64 = 100;

/// Number of daily summaries returned by the daily-summaries endpoint.
pub const DAILY_SUMMARIES_LIMIT: i64 = 30;
