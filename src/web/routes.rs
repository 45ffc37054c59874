use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::AppState;
use crate::constants::{DAILY_SUMMARIES_LIMIT, RECENT_POSTS_LIMIT};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/posts", get(recent_posts))
        .route("/api/posts/:id", get(post_detail))
        .route("/api/threads/:thread_id", get(thread_detail))
        .route("/api/daily-summaries", get(daily_summaries))
        .route("/api/categories", get(categories))
        .route("/api/categories/:category", get(category_posts))
        .route("/api/stats/users", get(user_stats))
        .route("/api/stats/daily", get(daily_stats))
        .route("/api/*rest", get(api_not_found))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn internal_error(what: &str, e: &anyhow::Error) -> Response {
    tracing::error!("Failed to fetch {what}: {e:#}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
}

/// Serialize a query result, or report its error as a 500.
fn json_or_500<T: Serialize>(what: &str, result: anyhow::Result<T>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => internal_error(what, &e),
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn recent_posts(State(state): State<AppState>) -> Response {
    json_or_500(
        "recent posts",
        state.queries.recent_posts(RECENT_POSTS_LIMIT).await,
    )
}

async fn post_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.post(id).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Post not found"),
        Err(e) => internal_error("post", &e),
    }
}

async fn thread_detail(State(state): State<AppState>, Path(thread_id): Path<i64>) -> Response {
    json_or_500("thread", state.queries.thread(thread_id).await)
}

async fn daily_summaries(State(state): State<AppState>) -> Response {
    json_or_500(
        "daily summaries",
        state.queries.daily_summaries(DAILY_SUMMARIES_LIMIT).await,
    )
}

async fn categories(State(state): State<AppState>) -> Response {
    json_or_500("categories", state.queries.categories().await)
}

async fn category_posts(State(state): State<AppState>, Path(category): Path<String>) -> Response {
    json_or_500(
        "category posts",
        state.queries.posts_in_category(&category).await,
    )
}

async fn user_stats(State(state): State<AppState>) -> Response {
    json_or_500("user stats", state.queries.user_stats().await)
}

async fn daily_stats(State(state): State<AppState>) -> Response {
    json_or_500("daily stats", state.queries.daily_stats().await)
}

async fn api_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
