use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{ChatMessage, ChatRequest, TextGenerator};

/// Characters of post text sent to the model after markup is stripped.
pub const MAX_INPUT_CHARS: usize = 3000;

const SIMPLIFY_MAX_TOKENS: u32 = 300;
const DAILY_MAX_TOKENS: u32 = 250;
const THREAD_MAX_TOKENS: u32 = 300;

const SIMPLIFY_FALLBACK: &str =
    "This post discusses technical research topics. Check the original post for details.";
const SYNTHESIS_FALLBACK: &str =
    "A summary is not available right now. See the individual posts for details.";

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Remove markup tags, leaving the text between them.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    TAG_PATTERN.replace_all(html, "").into_owned()
}

/// What a synthesized paragraph summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisContext {
    /// All posts created on one day.
    Daily(NaiveDate),
    /// All posts of one thread.
    Thread,
}

/// Prompt builder over a [`TextGenerator`].
///
/// Both operations always return a non-empty string: generation failures are
/// logged and replaced by a fixed fallback sentence.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    forum_name: String,
}

impl Summarizer {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, forum_name: impl Into<String>) -> Self {
        Self {
            generator,
            forum_name: forum_name.into(),
        }
    }

    /// Rewrite a post in simple language.
    pub async fn simplify(&self, text: &str) -> String {
        let clean: String = strip_tags(text).chars().take(MAX_INPUT_CHARS).collect();

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(
                    "You are a helpful assistant that explains complex topics in simple terms. \
                     Provide an ELI5 (Explain Like I'm 5) summary that a non-technical person \
                     would understand.",
                ),
                ChatMessage::user(format!(
                    "Please provide an ELI5 (Explain Like I'm 5) summary of this technical post \
                     from the {}. Make it simple and easy to understand for non-technical \
                     people:\n\n{clean}",
                    self.forum_name
                )),
            ],
            max_tokens: SIMPLIFY_MAX_TOKENS,
        };

        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Model returned an empty ELI5 summary, using fallback");
                SIMPLIFY_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Failed to generate ELI5 summary, using fallback");
                SIMPLIFY_FALLBACK.to_string()
            }
        }
    }

    /// Combine related texts into one paragraph.
    pub async fn synthesize(&self, texts: &[String], context: SynthesisContext) -> String {
        if texts.is_empty() {
            debug!(?context, "Nothing to synthesize");
            return SYNTHESIS_FALLBACK.to_string();
        }

        let joined = texts.join("\n\n");
        let request = match context {
            SynthesisContext::Daily(date) => ChatRequest {
                messages: vec![
                    ChatMessage::system(
                        "You are a helpful assistant that creates concise and informative daily \
                         summaries.",
                    ),
                    ChatMessage::user(format!(
                        "Create a one-paragraph summary of all the following {} posts from \
                         {}:\n\n{joined}",
                        self.forum_name,
                        date.format("%a %b %d %Y")
                    )),
                ],
                max_tokens: DAILY_MAX_TOKENS,
            },
            SynthesisContext::Thread => ChatRequest {
                messages: vec![
                    ChatMessage::system(
                        "You are a helpful assistant that summarizes forum discussions.",
                    ),
                    ChatMessage::user(format!(
                        "Create a concise summary of this entire thread from the {}:\n\n{joined}",
                        self.forum_name
                    )),
                ],
                max_tokens: THREAD_MAX_TOKENS,
            },
        };

        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(?context, "Model returned an empty synthesis, using fallback");
                SYNTHESIS_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(?context, error = %e, "Failed to synthesize summary, using fallback");
                SYNTHESIS_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::GenerationError;

    /// Records every request and replies with a fixed result.
    struct Recording {
        reply: Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl Recording {
        fn new(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_user_message(&self) -> String {
            let requests = self.requests.lock().unwrap();
            let request = requests.last().unwrap();
            request.messages.last().unwrap().content.clone()
        }
    }

    #[async_trait]
    impl TextGenerator for Recording {
        async fn generate(&self, request: &ChatRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply
                .clone()
                .map_err(GenerationError::GenerationFailed)
        }
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags("no markup"), "no markup");
        assert_eq!(strip_tags(r#"<a href="x">link</a> text"#), "link text");
    }

    #[tokio::test]
    async fn test_simplify_strips_and_truncates() {
        let generator = Recording::new(Ok("simple"));
        let summarizer = Summarizer::new(generator.clone(), "Test Forum");

        let long = format!("<p>{}</p>", "a".repeat(MAX_INPUT_CHARS + 500));
        let out = summarizer.simplify(&long).await;
        assert_eq!(out, "simple");

        let prompt = generator.last_user_message();
        assert!(prompt.contains("Test Forum"));
        assert!(!prompt.contains("<p>"));
        let body = prompt.rsplit("\n\n").next().unwrap();
        assert_eq!(body.chars().count(), MAX_INPUT_CHARS);
    }

    #[tokio::test]
    async fn test_simplify_falls_back_on_error() {
        let summarizer = Summarizer::new(Recording::new(Err("quota")), "Test Forum");
        let out = summarizer.simplify("<p>hi</p>").await;
        assert_eq!(out, SIMPLIFY_FALLBACK);
    }

    #[tokio::test]
    async fn test_simplify_falls_back_on_blank_output() {
        let summarizer = Summarizer::new(Recording::new(Ok("   ")), "Test Forum");
        assert_eq!(summarizer.simplify("hi").await, SIMPLIFY_FALLBACK);
    }

    #[tokio::test]
    async fn test_synthesize_daily_prompt() {
        let generator = Recording::new(Ok("the day"));
        let summarizer = Summarizer::new(generator.clone(), "Test Forum");
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let texts = vec!["A: one".to_string(), "B: two".to_string()];
        let out = summarizer
            .synthesize(&texts, SynthesisContext::Daily(date))
            .await;
        assert_eq!(out, "the day");

        let prompt = generator.last_user_message();
        assert!(prompt.contains("Tue Mar 05 2024"));
        assert!(prompt.ends_with("A: one\n\nB: two"));
    }

    #[tokio::test]
    async fn test_synthesize_falls_back() {
        let summarizer = Summarizer::new(Recording::new(Err("down")), "Test Forum");
        let out = summarizer
            .synthesize(&["x".to_string()], SynthesisContext::Thread)
            .await;
        assert_eq!(out, SYNTHESIS_FALLBACK);

        let generator = Recording::new(Ok("unused"));
        let summarizer = Summarizer::new(generator.clone(), "Test Forum");
        let out = summarizer.synthesize(&[], SynthesisContext::Thread).await;
        assert_eq!(out, SYNTHESIS_FALLBACK);
        assert!(generator.requests.lock().unwrap().is_empty());
    }
}
