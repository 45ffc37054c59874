use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::{debug, info};

use crate::db::{
    format_timestamp, get_daily_summary, get_posts_created_between, insert_daily_summary,
    Database, NewDailySummary,
};
use crate::llm::{Summarizer, SynthesisContext};

/// What the daily step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyOutcome {
    /// The run ended before the daily step.
    NotChecked,
    /// A summary for the day was already stored; nothing was generated.
    AlreadyExists,
    /// No posts were created that day.
    NoPosts,
    /// A new summary covering `post_count` posts was stored.
    Created { post_count: usize },
}

/// First and last millisecond of `date` in `tz`, as UTC instants.
pub fn day_bounds<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(tz, date);
    let next = start_of_day(tz, date + chrono::Duration::days(1));
    (start, next - chrono::Duration::milliseconds(1))
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // Midnight skipped by a DST jump: the day starts at the first valid local time.
        LocalResult::None => first_valid_after(tz, midnight),
    }
}

fn first_valid_after<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    (1..=24)
        .map(|h| naive + chrono::Duration::hours(h))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Distinct values in order of first appearance.
pub fn unique_in_order<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(*v))
        .map(ToString::to_string)
        .collect()
}

/// Store a summary of `today`'s posts unless one already exists.
///
/// The row is keyed by `YYYY-MM-DD` and also records the instant of local
/// midnight, which clients parse as the summary's date.
///
/// Summaries are snapshots: once stored, a day's summary is never regenerated,
/// even if more posts for that day arrive later.
pub(crate) async fn ensure_daily_summary(
    db: &Database,
    summarizer: &Summarizer,
    today: NaiveDate,
) -> Result<DailyOutcome> {
    let date_key = today.format("%Y-%m-%d").to_string();

    if get_daily_summary(db.pool(), &date_key).await?.is_some() {
        debug!(date = %date_key, "Daily summary already exists");
        return Ok(DailyOutcome::AlreadyExists);
    }

    let (start, end) = day_bounds(&Local, today);
    let posts =
        get_posts_created_between(db.pool(), &format_timestamp(start), &format_timestamp(end))
            .await?;

    if posts.is_empty() {
        debug!(date = %date_key, "No posts for today, skipping daily summary");
        return Ok(DailyOutcome::NoPosts);
    }

    let lines: Vec<String> = posts
        .iter()
        .map(|p| format!("{}: {}", p.title, p.eli5_summary))
        .collect();
    let summary = summarizer
        .synthesize(&lines, SynthesisContext::Daily(today))
        .await;

    let new_summary = NewDailySummary {
        date: date_key.clone(),
        starts_at: format_timestamp(start),
        summary,
        post_ids: posts.iter().map(|p| p.id).collect(),
        unique_authors: unique_in_order(posts.iter().map(|p| p.author_username.as_str())),
    };

    if !insert_daily_summary(db.pool(), &new_summary).await? {
        debug!(date = %date_key, "Daily summary stored concurrently by another run");
        return Ok(DailyOutcome::AlreadyExists);
    }

    info!(
        date = %date_key,
        posts = posts.len(),
        authors = new_summary.unique_authors.len(),
        "Stored daily summary"
    );

    Ok(DailyOutcome::Created {
        post_count: posts.len(),
    })
}
