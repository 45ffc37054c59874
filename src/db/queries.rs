use anyhow::{Context, Result};
use sqlx::types::Json;
use sqlx::SqlitePool;

use super::models::{DailyStats, DailySummary, NewDailySummary, NewPost, Post, UserStats};

const POST_COLUMNS: &str = "id, title, content, summary, eli5_summary, url, category, thread_id, \
     created_at, author_username, author_id";

const DAILY_SUMMARY_COLUMNS: &str = "date, starts_at, summary, post_ids, unique_authors, created_at";

// ========== Posts ==========

/// Check whether a post with the given forum id is stored.
pub async fn post_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to check post existence")?;
    Ok(row.is_some())
}

/// Get a post by its forum id.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")
}

/// Insert a new post.
///
/// Returns `false` without touching the stored row if a post with the same id
/// already exists.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO posts (id, title, content, summary, eli5_summary, url, category,
                           thread_id, created_at, author_username, author_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        ",
    )
    .bind(post.id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.summary)
    .bind(&post.eli5_summary)
    .bind(&post.url)
    .bind(&post.category)
    .bind(post.thread_id)
    .bind(&post.created_at)
    .bind(&post.author_username)
    .bind(post.author_id)
    .execute(pool)
    .await
    .context("Failed to insert post")?;

    Ok(result.rows_affected() > 0)
}

/// Count all stored posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(row.0)
}

/// Get the most recently created posts, newest first.
pub async fn get_recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<Post>> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch recent posts")
}

/// Get all posts of a thread, oldest first.
pub async fn get_posts_by_thread(pool: &SqlitePool, thread_id: i64) -> Result<Vec<Post>> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE thread_id = ? ORDER BY created_at ASC, id ASC"
    ))
    .bind(thread_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch thread posts")
}

/// Get all posts in a category, newest first.
pub async fn get_posts_by_category(pool: &SqlitePool, category: &str) -> Result<Vec<Post>> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE category = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(category)
    .fetch_all(pool)
    .await
    .context("Failed to fetch category posts")
}

/// Get every distinct category label, sorted.
pub async fn get_categories(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT category FROM posts WHERE category IS NOT NULL ORDER BY category",
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch categories")?;

    Ok(rows.into_iter().map(|(c,)| c).collect())
}

/// Get posts whose `created_at` lies within `[start, end]` (inclusive), oldest first.
///
/// Both bounds must be formatted with [`super::format_timestamp`].
pub async fn get_posts_created_between(
    pool: &SqlitePool,
    start: &str,
    end: &str,
) -> Result<Vec<Post>> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts
         WHERE created_at >= ? AND created_at <= ?
         ORDER BY created_at ASC, id ASC"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to fetch posts for date range")
}

// ========== Daily summaries ==========

/// Get the daily summary for a `YYYY-MM-DD` date.
pub async fn get_daily_summary(pool: &SqlitePool, date: &str) -> Result<Option<DailySummary>> {
    sqlx::query_as(&format!(
        "SELECT {DAILY_SUMMARY_COLUMNS} FROM daily_summaries WHERE date = ?"
    ))
    .bind(date)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch daily summary")
}

/// Insert a daily summary.
///
/// Returns `false` if that date already has one; the stored summary is kept.
pub async fn insert_daily_summary(pool: &SqlitePool, summary: &NewDailySummary) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO daily_summaries (date, starts_at, summary, post_ids, unique_authors)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(date) DO NOTHING
        ",
    )
    .bind(&summary.date)
    .bind(&summary.starts_at)
    .bind(&summary.summary)
    .bind(Json(&summary.post_ids))
    .bind(Json(&summary.unique_authors))
    .execute(pool)
    .await
    .context("Failed to insert daily summary")?;

    Ok(result.rows_affected() > 0)
}

/// Get the latest daily summaries, newest date first.
pub async fn get_recent_daily_summaries(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<DailySummary>> {
    sqlx::query_as(&format!(
        "SELECT {DAILY_SUMMARY_COLUMNS} FROM daily_summaries ORDER BY date DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to fetch daily summaries")
}

// ========== Statistics ==========

/// Per-author post counts, activity range and categories, most active first.
pub async fn get_user_stats(pool: &SqlitePool) -> Result<Vec<UserStats>> {
    let rows: Vec<(String, i64, String, String, Json<Vec<Option<String>>>)> = sqlx::query_as(
        r"
        SELECT
            author_username,
            COUNT(*) AS post_count,
            MIN(created_at) AS first_post,
            MAX(created_at) AS last_post,
            json_group_array(DISTINCT category) AS categories
        FROM posts
        GROUP BY author_username
        ORDER BY post_count DESC, author_username ASC
        ",
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch user stats")?;

    Ok(rows
        .into_iter()
        .map(
            |(username, post_count, first_post, last_post, Json(categories))| UserStats {
                username,
                post_count,
                first_post,
                last_post,
                categories: categories.into_iter().flatten().collect(),
            },
        )
        .collect())
}

/// Per-day post and author counts, newest day first.
pub async fn get_daily_stats(pool: &SqlitePool) -> Result<Vec<DailyStats>> {
    sqlx::query_as(
        r"
        SELECT
            substr(created_at, 1, 10) AS date,
            COUNT(*) AS post_count,
            COUNT(DISTINCT author_username) AS author_count
        FROM posts
        GROUP BY date
        ORDER BY date DESC
        ",
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch daily stats")
}
