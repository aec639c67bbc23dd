//! Binds an event's roster to its anchor message. Every roster
//! mutation is a load, transition, write-back cycle against the
//! anchor, serialized per anchor so two signups for the same event
//! cannot clobber each other's read.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::event::anchor::{Anchor, Embed};
use crate::event::record::{EventRecord, timestamp_markup};
use crate::platform::schedule::{ScheduleError, SchedulingFacility};
use crate::platform::store::{MessageStore, StoreError};
use crate::roster::codec::{self, CodecError};
use crate::roster::{DesiredStatus, Job, Outcome, Roster};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("You can only use this command in an event thread")]
    NotAnEventAnchor,
    #[error("No scheduled activity matches event {0:?}")]
    AnchorNotFound(String),
    #[error("Message store error: {0}")]
    Store(#[from] StoreError),
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("Roster field corrupted: {0}")]
    Codec(#[from] CodecError),
}

/// Handle returned by [`EventAdapter::create_event`]. The anchor write
/// always succeeded; `schedule_synced` is false when the secondary
/// scheduled-activity registration failed and was left for manual
/// correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub anchor_id: String,
    pub schedule_synced: bool,
}

/// Schedule fields an event-edit rewrites; the roster is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleChange {
    pub start: DateTime<Utc>,
    pub duration_hours: u32,
    pub location_id: String,
    pub ping_role_id: String,
}

impl ScheduleChange {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::hours(self.duration_hours as i64)
    }

    fn schedule_content(&self) -> String {
        format!(
            "{}\nDuration: {} hr(s)\n<@&{}>",
            timestamp_markup(self.start),
            self.duration_hours,
            self.ping_role_id
        )
    }
}

pub struct EventAdapter<S, F> {
    store: S,
    scheduler: F,
    anchor_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: MessageStore, F: SchedulingFacility> EventAdapter<S, F> {
    pub fn new(store: S, scheduler: F) -> Self {
        Self {
            store,
            scheduler,
            anchor_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn anchor_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.anchor_locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Creates the event thread with an empty roster, stamps the
    /// anchor id into the footer, then registers the matching
    /// scheduled activity. A scheduling failure is logged and surfaced
    /// on the handle; the anchor write is never rolled back.
    pub async fn create_event(
        &self,
        channel_id: &str,
        record: &EventRecord,
    ) -> Result<CreatedEvent, AdapterError> {
        let embed = Embed::for_event(&record.name, &record.description);
        let anchor = self
            .store
            .create_event_thread(channel_id, &record.name, &record.schedule_content(), &embed)
            .await?;

        tracing::info!(
            "Created event thread {} for {:?}",
            anchor.thread_id,
            record.name
        );

        let stamped = embed.with_footer(format!("ID: {}", anchor.message_id));
        self.store
            .edit_message(&anchor.thread_id, &anchor.message_id, None, &stamped)
            .await?;

        let schedule_synced = match self
            .scheduler
            .create_scheduled_activity(
                &record.name,
                &record.description,
                record.start,
                record.end(),
                &record.location_id,
            )
            .await
        {
            Ok(activity) => {
                tracing::info!("Registered scheduled activity {}", activity.id);
                true
            }
            Err(err) => {
                tracing::warn!(
                    "Scheduled activity creation failed for {:?}: {}",
                    record.name,
                    err
                );
                false
            }
        };

        Ok(CreatedEvent {
            anchor_id: anchor.message_id,
            schedule_synced,
        })
    }

    /// Loads and validates the anchor, then parses both roster lists.
    /// Threads whose first message was not authored by this system, or
    /// whose embed lacks the fixed-position roster fields, are not
    /// event threads.
    pub async fn load_roster(&self, thread_id: &str) -> Result<(Anchor, Roster), AdapterError> {
        let anchor = self.store.fetch_first_message(thread_id).await?;
        if !anchor.system_authored {
            return Err(AdapterError::NotAnEventAnchor);
        }

        let attending = anchor
            .embed
            .attending_text()
            .ok_or(AdapterError::NotAnEventAnchor)?;
        let tentative = anchor
            .embed
            .tentative_text()
            .ok_or(AdapterError::NotAnEventAnchor)?;

        let roster = Roster::new(codec::deserialize(attending)?, codec::deserialize(tentative)?);
        Ok((anchor, roster))
    }

    /// Runs the load, transition, write-back cycle as one unit,
    /// holding the anchor's lock throughout.
    pub async fn signup(
        &self,
        thread_id: &str,
        identity: &str,
        job: Job,
        desired: DesiredStatus,
    ) -> Result<Outcome, AdapterError> {
        let lock = self.anchor_lock(thread_id).await;
        let _guard = lock.lock().await;

        let (anchor, mut roster) = self.load_roster(thread_id).await?;
        let outcome = roster.apply_registration(identity, job, desired);

        let mut embed = anchor.embed.clone();
        if !embed.set_attending_text(codec::serialize(&roster.attending))
            || !embed.set_tentative_text(codec::serialize(&roster.tentative))
        {
            return Err(AdapterError::NotAnEventAnchor);
        }

        self.store
            .edit_message(&anchor.thread_id, &anchor.message_id, None, &embed)
            .await?;

        tracing::info!(
            "Signup in {}: {} -> {:?}",
            thread_id,
            identity,
            outcome
        );
        Ok(outcome)
    }

    /// Rewrites the anchor's schedule line in place (roster untouched),
    /// then retargets the scheduled activity matched by thread name.
    /// When no activity matches, the message edit has already
    /// persisted and the mismatch is reported to the caller.
    pub async fn edit_event(
        &self,
        thread_id: &str,
        change: &ScheduleChange,
    ) -> Result<(), AdapterError> {
        let lock = self.anchor_lock(thread_id).await;
        let _guard = lock.lock().await;

        let anchor = self.store.fetch_first_message(thread_id).await?;
        if !anchor.system_authored {
            return Err(AdapterError::NotAnEventAnchor);
        }

        self.store
            .edit_message(
                &anchor.thread_id,
                &anchor.message_id,
                Some(&change.schedule_content()),
                &anchor.embed,
            )
            .await?;

        let activities = self.scheduler.list_scheduled_activities().await?;
        let activity = activities
            .into_iter()
            .find(|activity| activity.name == anchor.thread_name)
            .ok_or_else(|| {
                tracing::warn!(
                    "No scheduled activity named {:?}; event left unsynced",
                    anchor.thread_name
                );
                AdapterError::AnchorNotFound(anchor.thread_name.clone())
            })?;

        self.scheduler
            .edit_scheduled_activity(&activity.id, change.start, change.end(), &change.location_id)
            .await?;

        tracing::info!("Edited event {} and activity {}", thread_id, activity.id);
        Ok(())
    }
}
