//! Forum ingestion: fetch new topics, summarize them, store them, roll up the day.

mod daily;

pub use daily::{day_bounds, unique_in_order, DailyOutcome};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::db::{format_timestamp, insert_post, post_exists, Database, NewPost};
use crate::forum::{ForumSource, TopicSummary};
use crate::llm::Summarizer;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("an ingestion run is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Result of listing the forum's recent topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Fetched(usize),
    /// The listing failed; the run processed no topics.
    Unavailable(String),
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub listing: Listing,
    pub new_posts: usize,
    pub already_stored: usize,
    /// Topics that could not be fetched or were malformed; retried next run.
    pub skipped: usize,
    pub daily: DailyOutcome,
}

impl IngestReport {
    fn new(listing: Listing) -> Self {
        Self {
            listing,
            new_posts: 0,
            already_stored: 0,
            skipped: 0,
            daily: DailyOutcome::NotChecked,
        }
    }
}

enum TopicOutcome {
    Stored,
    AlreadyStored,
    Skipped,
}

/// The ingestion pipeline with its injected collaborators.
///
/// Clones share one single-flight guard, so overlapping triggers against the
/// same `Ingestor` never run concurrently.
#[derive(Clone)]
pub struct Ingestor {
    db: Database,
    forum: Arc<dyn ForumSource>,
    summarizer: Summarizer,
    running: Arc<Mutex<()>>,
    clock: Arc<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl Ingestor {
    #[must_use]
    pub fn new(db: Database, forum: Arc<dyn ForumSource>, summarizer: Summarizer) -> Self {
        Self {
            db,
            forum,
            summarizer,
            running: Arc::new(Mutex::new(())),
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the local-date clock consulted by [`Ingestor::run`].
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Run the pipeline once.
    ///
    /// "Today" for the daily step is the local date read after every topic has
    /// been processed, so a run that crosses midnight summarizes the new day.
    ///
    /// # Errors
    ///
    /// Returns an error if another run is in progress or storage fails.
    pub async fn run(&self) -> Result<IngestReport, IngestError> {
        let clock = Arc::clone(&self.clock);
        self.run_with(move || clock()).await
    }

    /// Run the pipeline once with an explicit "today" for the daily step.
    ///
    /// # Errors
    ///
    /// Returns an error if another run is in progress or storage fails.
    pub async fn run_on(&self, today: NaiveDate) -> Result<IngestReport, IngestError> {
        self.run_with(move || today).await
    }

    async fn run_with(
        &self,
        today: impl FnOnce() -> NaiveDate + Send,
    ) -> Result<IngestReport, IngestError> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Ingestion already in progress, skipping trigger");
            return Err(IngestError::AlreadyRunning);
        };

        info!("Starting ingestion run");

        let topics = match self.forum.list_recent_topics().await {
            Ok(topics) => topics,
            Err(e) => {
                error!(error = %e, "Failed to list recent topics");
                return Ok(IngestReport::new(Listing::Unavailable(e.to_string())));
            }
        };

        let mut report = IngestReport::new(Listing::Fetched(topics.len()));
        if topics.is_empty() {
            info!("Forum listed no topics, nothing to do");
            return Ok(report);
        }

        for topic in &topics {
            match self.ingest_topic(topic).await? {
                TopicOutcome::Stored => report.new_posts += 1,
                TopicOutcome::AlreadyStored => report.already_stored += 1,
                TopicOutcome::Skipped => report.skipped += 1,
            }
        }

        let today = today();
        report.daily = daily::ensure_daily_summary(&self.db, &self.summarizer, today).await?;

        info!(
            %today,
            listed = topics.len(),
            new_posts = report.new_posts,
            already_stored = report.already_stored,
            skipped = report.skipped,
            daily = ?report.daily,
            "Ingestion run complete"
        );

        Ok(report)
    }

    async fn ingest_topic(&self, topic: &TopicSummary) -> anyhow::Result<TopicOutcome> {
        if post_exists(self.db.pool(), topic.id).await? {
            debug!(topic_id = topic.id, "Topic already stored");
            return Ok(TopicOutcome::AlreadyStored);
        }

        let detail = match self.forum.fetch_topic(topic.id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(topic_id = topic.id, error = %e, "Failed to fetch topic, skipping");
                return Ok(TopicOutcome::Skipped);
            }
        };

        let Some(first_post) = detail.first_post() else {
            warn!(topic_id = topic.id, "Topic has no posts, skipping");
            return Ok(TopicOutcome::Skipped);
        };

        let created_at = match DateTime::parse_from_rfc3339(&topic.created_at) {
            Ok(ts) => format_timestamp(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(
                    topic_id = topic.id,
                    created_at = %topic.created_at,
                    error = %e,
                    "Topic has an unparseable creation time, skipping"
                );
                return Ok(TopicOutcome::Skipped);
            }
        };

        let eli5_summary = self.summarizer.simplify(&first_post.cooked).await;

        let post = NewPost {
            id: topic.id,
            title: topic.title.clone(),
            content: first_post.cooked.clone(),
            summary: topic.excerpt.clone(),
            eli5_summary,
            url: self.forum.topic_url(&topic.slug, topic.id),
            category: detail.category_name.clone(),
            thread_id: topic.id,
            created_at,
            author_username: first_post.username.clone(),
            author_id: first_post.user_id,
        };

        if !insert_post(self.db.pool(), &post).await? {
            debug!(topic_id = topic.id, "Topic stored concurrently by another run");
            return Ok(TopicOutcome::AlreadyStored);
        }

        info!(topic_id = topic.id, title = %topic.title, "Added post");
        Ok(TopicOutcome::Stored)
    }
}

/// Run ingestion now and then every `interval`, forever.
///
/// Errors are logged and the loop keeps going. A zero interval runs once and returns.
pub async fn poll_loop(ingestor: Ingestor, interval: Duration) {
    loop {
        match ingestor.run().await {
            Ok(report) => {
                if let Listing::Unavailable(reason) = &report.listing {
                    warn!(%reason, "Forum unavailable during scheduled ingestion");
                }
            }
            Err(e) => error!("Ingestion error: {e:#}"),
        }

        if interval.is_zero() {
            info!("Periodic ingestion disabled");
            return;
        }

        tokio::time::sleep(interval).await;
    }
}
