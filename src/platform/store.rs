use async_trait::async_trait;
use thiserror::Error;

use crate::event::anchor::{Anchor, Embed};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("No first message in thread {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// The host platform's message history, reduced to the operations the
/// event adapter needs. Implementations supply authorship metadata on
/// every fetched anchor so spoofed threads can be rejected.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Returns the oldest message of the thread together with its
    /// embed and authorship metadata.
    async fn fetch_first_message(&self, thread_id: &str) -> Result<Anchor, StoreError>;

    /// Creates an event thread whose starting message carries the
    /// given content and embed, and returns its anchor.
    async fn create_event_thread(
        &self,
        channel_id: &str,
        name: &str,
        content: &str,
        embed: &Embed,
    ) -> Result<Anchor, StoreError>;

    /// Rewrites a message in place. `content` is left untouched when
    /// `None`; the embed is always replaced.
    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        content: Option<&str>,
        embed: &Embed,
    ) -> Result<(), StoreError>;
}
