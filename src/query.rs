//! Read-only views over stored posts and daily summaries.

use anyhow::Result;
use serde::Serialize;

use crate::db::{
    get_categories, get_daily_stats, get_post, get_posts_by_category, get_posts_by_thread,
    get_recent_daily_summaries, get_recent_posts, get_user_stats, DailyStats, DailySummary,
    Database, Post, UserStats,
};
use crate::llm::{Summarizer, SynthesisContext};

/// Posts of one thread plus a generated overview when there is more than one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    pub posts: Vec<Post>,
    pub thread_summary: Option<String>,
}

#[derive(Clone)]
pub struct QueryService {
    db: Database,
    summarizer: Summarizer,
}

impl QueryService {
    #[must_use]
    pub fn new(db: Database, summarizer: Summarizer) -> Self {
        Self { db, summarizer }
    }

    pub async fn post(&self, id: i64) -> Result<Option<Post>> {
        get_post(self.db.pool(), id).await
    }

    pub async fn recent_posts(&self, limit: i64) -> Result<Vec<Post>> {
        get_recent_posts(self.db.pool(), limit).await
    }

    /// Posts of a thread, oldest first.
    ///
    /// The thread summary is synthesized on every call and only when the
    /// thread has at least two posts.
    pub async fn thread(&self, thread_id: i64) -> Result<ThreadView> {
        let posts = get_posts_by_thread(self.db.pool(), thread_id).await?;

        let thread_summary = if posts.len() > 1 {
            let texts: Vec<String> = posts.iter().map(|p| p.eli5_summary.clone()).collect();
            Some(
                self.summarizer
                    .synthesize(&texts, SynthesisContext::Thread)
                    .await,
            )
        } else {
            None
        };

        Ok(ThreadView {
            posts,
            thread_summary,
        })
    }

    pub async fn daily_summaries(&self, limit: i64) -> Result<Vec<DailySummary>> {
        get_recent_daily_summaries(self.db.pool(), limit).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        get_categories(self.db.pool()).await
    }

    pub async fn posts_in_category(&self, category: &str) -> Result<Vec<Post>> {
        get_posts_by_category(self.db.pool(), category).await
    }

    pub async fn user_stats(&self) -> Result<Vec<UserStats>> {
        get_user_stats(self.db.pool()).await
    }

    pub async fn daily_stats(&self) -> Result<Vec<DailyStats>> {
        get_daily_stats(self.db.pool()).await
    }
}
