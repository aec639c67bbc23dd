//! In-process implementation of both platform traits, used by tests
//! and local dry-runs in place of the real host platform.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::event::anchor::{Anchor, Embed};
use crate::platform::schedule::{ScheduleError, ScheduledActivity, SchedulingFacility};
use crate::platform::store::{MessageStore, StoreError};

#[derive(Debug, Clone)]
struct StoredThread {
    name: String,
    content: String,
    message_id: String,
    embed: Embed,
    system_authored: bool,
}

#[derive(Debug, Default)]
struct State {
    threads: BTreeMap<String, StoredThread>,
    activities: Vec<ScheduledActivity>,
    next_id: u64,
    schedule_failures: u32,
}

#[derive(Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<Mutex<State>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("platform state poisoned")
    }

    /// Makes the next `times` scheduled-activity creations fail.
    pub fn fail_scheduling(&self, times: u32) {
        self.state().schedule_failures = times;
    }

    /// Seeds a thread whose first message was not authored by this
    /// system, mimicking an ordinary conversation thread.
    pub fn insert_foreign_thread(&self, thread_id: &str, name: &str) {
        self.insert_thread(thread_id, name, Embed::default(), false);
    }

    /// Seeds a system-authored thread whose embed lacks the roster
    /// field layout.
    pub fn insert_system_thread_without_roster(&self, thread_id: &str, name: &str) {
        self.insert_thread(thread_id, name, Embed::default(), true);
    }

    fn insert_thread(&self, thread_id: &str, name: &str, embed: Embed, system_authored: bool) {
        self.state().threads.insert(
            thread_id.to_string(),
            StoredThread {
                name: name.to_string(),
                content: String::new(),
                message_id: thread_id.to_string(),
                embed,
                system_authored,
            },
        );
    }

    pub fn thread_ids(&self) -> Vec<String> {
        self.state().threads.keys().cloned().collect()
    }

    pub fn thread_embed(&self, thread_id: &str) -> Option<Embed> {
        self.state()
            .threads
            .get(thread_id)
            .map(|thread| thread.embed.clone())
    }

    pub fn thread_content(&self, thread_id: &str) -> Option<String> {
        self.state()
            .threads
            .get(thread_id)
            .map(|thread| thread.content.clone())
    }

    pub fn activities(&self) -> Vec<ScheduledActivity> {
        self.state().activities.clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryPlatform {
    async fn fetch_first_message(&self, thread_id: &str) -> Result<Anchor, StoreError> {
        let state = self.state();
        let thread = state
            .threads
            .get(thread_id)
            .ok_or_else(|| StoreError::NotFound(thread_id.to_string()))?;
        Ok(Anchor {
            message_id: thread.message_id.clone(),
            thread_id: thread_id.to_string(),
            thread_name: thread.name.clone(),
            system_authored: thread.system_authored,
            embed: thread.embed.clone(),
        })
    }

    async fn create_event_thread(
        &self,
        _channel_id: &str,
        name: &str,
        content: &str,
        embed: &Embed,
    ) -> Result<Anchor, StoreError> {
        let mut state = self.state();
        state.next_id += 1;
        // Starting message id equals the thread id, as on the host
        // platform's forum threads.
        let thread_id = format!("thread-{}", state.next_id);
        state.threads.insert(
            thread_id.clone(),
            StoredThread {
                name: name.to_string(),
                content: content.to_string(),
                message_id: thread_id.clone(),
                embed: embed.clone(),
                system_authored: true,
            },
        );
        Ok(Anchor {
            message_id: thread_id.clone(),
            thread_id: thread_id.clone(),
            thread_name: name.to_string(),
            system_authored: true,
            embed: embed.clone(),
        })
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        content: Option<&str>,
        embed: &Embed,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let thread = state
            .threads
            .get_mut(thread_id)
            .filter(|thread| thread.message_id == message_id)
            .ok_or_else(|| StoreError::NotFound(thread_id.to_string()))?;
        if let Some(content) = content {
            thread.content = content.to_string();
        }
        thread.embed = embed.clone();
        Ok(())
    }
}

#[async_trait]
impl SchedulingFacility for InMemoryPlatform {
    async fn create_scheduled_activity(
        &self,
        name: &str,
        _description: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location_id: &str,
    ) -> Result<ScheduledActivity, ScheduleError> {
        let mut state = self.state();
        if state.schedule_failures > 0 {
            state.schedule_failures -= 1;
            return Err(ScheduleError::RequestError(
                "injected scheduling failure".to_string(),
            ));
        }
        state.next_id += 1;
        let activity = ScheduledActivity {
            id: format!("activity-{}", state.next_id),
            name: name.to_string(),
            start,
            end,
            location_id: location_id.to_string(),
        };
        state.activities.push(activity.clone());
        Ok(activity)
    }

    async fn list_scheduled_activities(&self) -> Result<Vec<ScheduledActivity>, ScheduleError> {
        Ok(self.state().activities.clone())
    }

    async fn edit_scheduled_activity(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location_id: &str,
    ) -> Result<(), ScheduleError> {
        let mut state = self.state();
        let activity = state
            .activities
            .iter_mut()
            .find(|activity| activity.id == id)
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;
        activity.start = start;
        activity.end = end;
        activity.location_id = location_id.to_string();
        Ok(())
    }
}
