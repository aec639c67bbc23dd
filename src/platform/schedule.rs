use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Scheduled activity not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One instant-bounded activity registered with the host platform's
/// native scheduling facility, so invitees get native reminders.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledActivity {
    pub id: String,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location_id: String,
}

#[async_trait]
pub trait SchedulingFacility: Send + Sync {
    async fn create_scheduled_activity(
        &self,
        name: &str,
        description: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location_id: &str,
    ) -> Result<ScheduledActivity, ScheduleError>;

    async fn list_scheduled_activities(&self) -> Result<Vec<ScheduledActivity>, ScheduleError>;

    async fn edit_scheduled_activity(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location_id: &str,
    ) -> Result<(), ScheduleError>;
}
