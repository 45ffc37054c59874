//! Test doubles and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use forum_digest::db::{format_timestamp, Database, NewPost};
use forum_digest::forum::{
    FetchError, ForumSource, PostStream, TopicDetail, TopicPost, TopicSummary,
};
use forum_digest::ingest::day_bounds;
use forum_digest::llm::{ChatRequest, GenerationError, TextGenerator};
use tempfile::TempDir;
use tokio::sync::Notify;

pub async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

/// A fixed test date.
pub fn test_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

/// A stored-format timestamp `hours` after local midnight of `date`.
pub fn local_time_on(date: NaiveDate, hours: i64) -> String {
    let (start, _) = day_bounds(&Local, date);
    format_timestamp(start + chrono::Duration::hours(hours))
}

pub fn topic(id: i64, title: &str, created_at: &str) -> TopicSummary {
    TopicSummary {
        id,
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        excerpt: Some(format!("excerpt of {title}")),
        created_at: created_at.to_string(),
    }
}

pub fn detail(cooked: &str, username: &str, user_id: i64, category: &str) -> TopicDetail {
    TopicDetail {
        category_name: Some(category.to_string()),
        post_stream: PostStream {
            posts: vec![TopicPost {
                cooked: cooked.to_string(),
                username: username.to_string(),
                user_id,
            }],
        },
    }
}

pub fn new_post(id: i64, author: &str, category: Option<&str>, created_at: &str) -> NewPost {
    NewPost {
        id,
        title: format!("Post {id}"),
        content: format!("<p>content {id}</p>"),
        summary: Some(format!("excerpt {id}")),
        eli5_summary: format!("simple {id}"),
        url: format!("https://forum.example.com/t/post-{id}/{id}"),
        category: category.map(str::to_string),
        thread_id: id,
        created_at: created_at.to_string(),
        author_username: author.to_string(),
        author_id: id * 10,
    }
}

/// In-memory forum.
#[derive(Default)]
pub struct FakeForum {
    pub topics: Mutex<Vec<TopicSummary>>,
    pub details: Mutex<HashMap<i64, TopicDetail>>,
    pub listing_down: Mutex<bool>,
    pub fetched: Mutex<Vec<i64>>,
    /// When set, listing signals `entered` and then waits on `release`.
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeForum {
    pub fn with_topics(topics: Vec<(TopicSummary, Option<TopicDetail>)>) -> Arc<Self> {
        let forum = Self::default();
        for (summary, detail) in topics {
            if let Some(detail) = detail {
                forum.details.lock().unwrap().insert(summary.id, detail);
            }
            forum.topics.lock().unwrap().push(summary);
        }
        Arc::new(forum)
    }

    pub fn add_topic(&self, summary: TopicSummary, detail: TopicDetail) {
        self.details.lock().unwrap().insert(summary.id, detail);
        self.topics.lock().unwrap().push(summary);
    }

    pub fn fetched(&self) -> Vec<i64> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForumSource for FakeForum {
    async fn list_recent_topics(&self) -> Result<Vec<TopicSummary>, FetchError> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if *self.listing_down.lock().unwrap() {
            return Err(FetchError::UpstreamUnavailable("connection refused".to_string()));
        }
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn fetch_topic(&self, topic_id: i64) -> Result<TopicDetail, FetchError> {
        self.fetched.lock().unwrap().push(topic_id);
        self.details
            .lock()
            .unwrap()
            .get(&topic_id)
            .cloned()
            .ok_or_else(|| FetchError::UpstreamUnavailable(format!("topic {topic_id}: 404")))
    }

    fn topic_url(&self, slug: &str, topic_id: i64) -> String {
        format!("https://forum.example.com/t/{slug}/{topic_id}")
    }
}

/// Text generator that counts calls and answers with a fixed reply.
pub struct FakeGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("quota exceeded".to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .clone()
            .map_err(GenerationError::GenerationFailed)
    }
}
