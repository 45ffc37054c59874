//! Forum digest library.
//!
//! Polls a Discourse forum for new topics, stores each topic's opening post
//! with a simplified summary generated by a language model, rolls each day's
//! posts up into a daily summary, and serves everything as a JSON API.

pub mod config;
pub mod constants;
pub mod db;
pub mod forum;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod query;
pub mod web;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::db::Database;
use crate::forum::DiscourseClient;
use crate::ingest::Ingestor;
use crate::llm::{ChatClient, Summarizer};

/// Live collaborators built from configuration.
pub struct Services {
    pub db: Database,
    pub summarizer: Summarizer,
    pub ingestor: Ingestor,
}

impl Services {
    /// Open the database and construct the forum and model clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or a client cannot be built.
    pub async fn connect(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let db = Database::new(&config.database_path)
            .await
            .context("Failed to initialize database")?;

        let forum = DiscourseClient::new(config).context("Failed to build forum client")?;
        let generator = ChatClient::new(config).context("Failed to build model client")?;
        let summarizer = Summarizer::new(Arc::new(generator), config.forum_name.clone());
        let ingestor = Ingestor::new(db.clone(), Arc::new(forum), summarizer.clone());

        Ok(Self {
            db,
            summarizer,
            ingestor,
        })
    }
}
