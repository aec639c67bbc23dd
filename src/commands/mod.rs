//! Typed command payloads and the dispatcher that turns them into
//! adapter calls and ephemeral replies. The gateway session that
//! receives interactions and feeds [`Invocation`]s in is the host
//! platform's side of the seam.

pub mod schema;

use thiserror::Error;

use crate::event::adapter::{AdapterError, EventAdapter, ScheduleChange};
use crate::event::record::EventRecord;
use crate::platform::schedule::SchedulingFacility;
use crate::platform::store::MessageStore;
use crate::roster::{Attendance, DesiredStatus, Job, Outcome, RosterError};
use crate::timekeeping::{Meridiem, ResolvedInstant, TimeError, TimeResolver};

/// User-visible replies disappear after this many seconds.
pub const REPLY_EXPIRY_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub ephemeral: bool,
    pub expires_after_secs: Option<u64>,
}

impl Reply {
    fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
            expires_after_secs: Some(REPLY_EXPIRY_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEventArgs {
    pub event_name: String,
    pub description: String,
    pub date: String,
    pub hour: u32,
    pub minute: String,
    pub am_pm: String,
    pub duration: u32,
    pub location_id: String,
    pub ping_role_id: String,
}

#[derive(Debug, Clone)]
pub struct SignupArgs {
    pub job: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct EditEventArgs {
    pub date: String,
    pub hour: u32,
    pub minute: String,
    pub am_pm: String,
    pub duration: u32,
    pub location_id: String,
    pub ping_role_id: String,
}

#[derive(Debug, Clone)]
pub enum Command {
    Ping,
    NewEvent(NewEventArgs),
    EventSignup(SignupArgs),
    EditEvent(EditEventArgs),
}

/// One received interaction: who invoked it, from which thread (if
/// any), and the choice-constrained arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub invoker: String,
    pub thread_id: Option<String>,
    pub command: Command,
}

pub struct Dispatcher<S, F> {
    adapter: EventAdapter<S, F>,
    resolver: TimeResolver,
    forum_channel_id: String,
}

impl<S: MessageStore, F: SchedulingFacility> Dispatcher<S, F> {
    pub fn new(
        adapter: EventAdapter<S, F>,
        resolver: TimeResolver,
        forum_channel_id: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            resolver,
            forum_channel_id: forum_channel_id.into(),
        }
    }

    /// Handles one invocation to completion. Never panics and never
    /// swallows a failure: every error becomes an ephemeral reply.
    pub async fn dispatch(&self, invocation: Invocation) -> Reply {
        let Invocation {
            invoker,
            thread_id,
            command,
        } = invocation;

        let result = match command {
            Command::Ping => Ok(Reply::ephemeral("Pong!")),
            Command::NewEvent(args) => self.handle_new_event(&invoker, args).await,
            Command::EventSignup(args) => {
                self.handle_signup(&invoker, thread_id.as_deref(), args).await
            }
            Command::EditEvent(args) => {
                self.handle_edit_event(&invoker, thread_id.as_deref(), args).await
            }
        };

        result.unwrap_or_else(|err| {
            tracing::warn!("Command by {} failed: {}", invoker, err);
            Reply::ephemeral(render_error(&err))
        })
    }

    fn resolve_start(
        &self,
        invoker: &str,
        date: &str,
        hour: u32,
        minute: &str,
        am_pm: &str,
    ) -> Result<ResolvedInstant, DispatchError> {
        let meridiem: Meridiem = am_pm.parse()?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| TimeError::InvalidClock(minute.to_string()))?;
        Ok(self.resolver.resolve(invoker, date, hour, minute, meridiem)?)
    }

    async fn handle_new_event(
        &self,
        invoker: &str,
        args: NewEventArgs,
    ) -> Result<Reply, DispatchError> {
        let start = self.resolve_start(invoker, &args.date, args.hour, &args.minute, &args.am_pm)?;

        let record = EventRecord {
            name: args.event_name.clone(),
            description: args.description.clone(),
            start: start.utc,
            duration_hours: args.duration,
            location_id: args.location_id.clone(),
            ping_role_id: args.ping_role_id.clone(),
        };
        let created = self.adapter.create_event(&self.forum_channel_id, &record).await?;

        let mut text = format!(
            "Event created! You can find the details below:\n\
             Event Name: {}\n\
             Description: {}\n\
             Date: {}\n\
             Time: {}:{} {}\n\
             Duration: {} hr(s)\n\
             Voice Channel: <#{}>\n\
             Pinged Role: <@&{}>",
            args.event_name,
            args.description,
            args.date,
            args.hour,
            args.minute,
            args.am_pm,
            args.duration,
            args.location_id,
            args.ping_role_id,
        );
        if !created.schedule_synced {
            text.push_str(
                "\nWarning: the server scheduled event could not be created; please add it manually.",
            );
        }
        Ok(Reply::ephemeral(text))
    }

    async fn handle_signup(
        &self,
        invoker: &str,
        thread_id: Option<&str>,
        args: SignupArgs,
    ) -> Result<Reply, DispatchError> {
        let thread_id = thread_id.ok_or(AdapterError::NotAnEventAnchor)?;
        let job: Job = args.job.parse()?;
        let desired: DesiredStatus = args.status.parse()?;

        let outcome = self.adapter.signup(thread_id, invoker, job, desired).await?;

        Ok(Reply::ephemeral(match outcome {
            Outcome::Registered(Attendance::Attending) => {
                "You were successfully registered as Attending for the event."
            }
            Outcome::Registered(Attendance::Tentative) => {
                "You were successfully registered as Tentative for the event."
            }
            Outcome::Unregistered => "You were successfully unregistered from the event.",
        }))
    }

    async fn handle_edit_event(
        &self,
        invoker: &str,
        thread_id: Option<&str>,
        args: EditEventArgs,
    ) -> Result<Reply, DispatchError> {
        let thread_id = thread_id.ok_or(AdapterError::NotAnEventAnchor)?;
        let start = self.resolve_start(invoker, &args.date, args.hour, &args.minute, &args.am_pm)?;

        let change = ScheduleChange {
            start: start.utc,
            duration_hours: args.duration,
            location_id: args.location_id.clone(),
            ping_role_id: args.ping_role_id.clone(),
        };
        self.adapter.edit_event(thread_id, &change).await?;

        Ok(Reply::ephemeral(format!(
            "Event edited! Details:\n\
             Date: {}\n\
             Time: {}:{} {}\n\
             Duration: {} hr(s)\n\
             Voice Channel: <#{}>\n\
             Pinged Role: <@&{}>",
            args.date,
            args.hour,
            args.minute,
            args.am_pm,
            args.duration,
            args.location_id,
            args.ping_role_id,
        )))
    }
}

fn render_error(err: &DispatchError) -> String {
    match err {
        DispatchError::Adapter(AdapterError::NotAnEventAnchor) => {
            "You can only use this command in an event thread".to_string()
        }
        DispatchError::Adapter(AdapterError::Store(_) | AdapterError::Schedule(_)) => {
            format!("Error, please report to an Admin: {err}")
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::InMemoryPlatform;
    use crate::timekeeping::TimezoneTable;
    use chrono::{TimeZone, Utc};

    fn dispatcher(
        platform: &InMemoryPlatform,
    ) -> Dispatcher<InMemoryPlatform, InMemoryPlatform> {
        let adapter = EventAdapter::new(platform.clone(), platform.clone());
        let table = TimezoneTable::new(vec![(
            chrono_tz::US::Eastern,
            vec!["Alice".to_string(), "Bob".to_string()],
        )]);
        Dispatcher::new(adapter, TimeResolver::new(table, 2023), "forum-1")
    }

    fn new_event(invoker: &str) -> Invocation {
        Invocation {
            invoker: invoker.to_string(),
            thread_id: None,
            command: Command::NewEvent(NewEventArgs {
                event_name: "Raid Night".to_string(),
                description: "Weekly clear".to_string(),
                date: "5-23".to_string(),
                hour: 3,
                minute: "30".to_string(),
                am_pm: "PM".to_string(),
                duration: 2,
                location_id: "voice-1".to_string(),
                ping_role_id: "role-1".to_string(),
            }),
        }
    }

    fn signup(invoker: &str, thread_id: Option<&str>, job: &str, status: &str) -> Invocation {
        Invocation {
            invoker: invoker.to_string(),
            thread_id: thread_id.map(str::to_string),
            command: Command::EventSignup(SignupArgs {
                job: job.to_string(),
                status: status.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn ping_pongs() {
        let platform = InMemoryPlatform::new();
        let reply = dispatcher(&platform)
            .dispatch(Invocation {
                invoker: "Alice".to_string(),
                thread_id: None,
                command: Command::Ping,
            })
            .await;
        assert_eq!(reply.text, "Pong!");
    }

    #[tokio::test]
    async fn new_event_creates_thread_and_activity() {
        let platform = InMemoryPlatform::new();
        let reply = dispatcher(&platform).dispatch(new_event("Alice")).await;

        assert!(reply.text.starts_with("Event created!"));
        assert!(reply.ephemeral);
        assert_eq!(reply.expires_after_secs, Some(REPLY_EXPIRY_SECS));

        assert_eq!(platform.thread_ids().len(), 1);
        let activities = platform.activities();
        assert_eq!(activities.len(), 1);
        // 3:30 PM US/Eastern on 2023-05-23 is 19:30 UTC.
        assert_eq!(
            activities[0].start,
            Utc.with_ymd_and_hms(2023, 5, 23, 19, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn signup_walks_the_full_cycle() {
        let platform = InMemoryPlatform::new();
        let dispatcher = dispatcher(&platform);
        dispatcher.dispatch(new_event("Alice")).await;
        let thread = platform.thread_ids().remove(0);

        let reply = dispatcher
            .dispatch(signup("Bob", Some(&thread), "WHM", "Attending"))
            .await;
        assert_eq!(
            reply.text,
            "You were successfully registered as Attending for the event."
        );

        let embed = platform.thread_embed(&thread).unwrap();
        assert_eq!(embed.attending_text(), Some("WHM - Bob"));

        let reply = dispatcher
            .dispatch(signup("Bob", Some(&thread), "WHM", "Unregister"))
            .await;
        assert_eq!(reply.text, "You were successfully unregistered from the event.");

        let embed = platform.thread_embed(&thread).unwrap();
        assert_eq!(embed.attending_text(), Some(""));
    }

    #[tokio::test]
    async fn signup_outside_an_event_thread_is_rejected() {
        let platform = InMemoryPlatform::new();
        let reply = dispatcher(&platform)
            .dispatch(signup("Bob", None, "WHM", "Attending"))
            .await;
        assert_eq!(reply.text, "You can only use this command in an event thread");
    }

    #[tokio::test]
    async fn signup_in_a_foreign_thread_is_rejected() {
        let platform = InMemoryPlatform::new();
        platform.insert_foreign_thread("chat-1", "General");

        let reply = dispatcher(&platform)
            .dispatch(signup("Bob", Some("chat-1"), "WHM", "Attending"))
            .await;
        assert_eq!(reply.text, "You can only use this command in an event thread");
    }

    #[tokio::test]
    async fn invalid_job_is_reported_without_any_mutation() {
        let platform = InMemoryPlatform::new();
        let dispatcher = dispatcher(&platform);
        dispatcher.dispatch(new_event("Alice")).await;
        let thread = platform.thread_ids().remove(0);

        let reply = dispatcher
            .dispatch(signup("Bob", Some(&thread), "BLU", "Attending"))
            .await;
        assert_eq!(reply.text, "Unknown job: BLU");

        let embed = platform.thread_embed(&thread).unwrap();
        assert_eq!(embed.attending_text(), Some(""));
    }

    #[tokio::test]
    async fn invalid_status_is_reported_without_any_mutation() {
        let platform = InMemoryPlatform::new();
        let dispatcher = dispatcher(&platform);
        dispatcher.dispatch(new_event("Alice")).await;
        let thread = platform.thread_ids().remove(0);

        let reply = dispatcher
            .dispatch(signup("Bob", Some(&thread), "WHM", "Maybe"))
            .await;
        assert_eq!(reply.text, "Unknown attendance status: Maybe");
    }

    #[tokio::test]
    async fn unassigned_invoker_cannot_schedule() {
        let platform = InMemoryPlatform::new();
        let reply = dispatcher(&platform).dispatch(new_event("Zed")).await;

        assert_eq!(reply.text, "No timezone assignment for Zed");
        assert!(platform.thread_ids().is_empty());
    }

    #[tokio::test]
    async fn scheduling_failure_becomes_a_warning_not_an_error() {
        let platform = InMemoryPlatform::new();
        platform.fail_scheduling(1);

        let reply = dispatcher(&platform).dispatch(new_event("Alice")).await;

        assert!(reply.text.starts_with("Event created!"));
        assert!(reply.text.contains("Warning"));
        assert_eq!(platform.thread_ids().len(), 1);
    }

    #[tokio::test]
    async fn edit_event_rewrites_the_schedule() {
        let platform = InMemoryPlatform::new();
        let dispatcher = dispatcher(&platform);
        dispatcher.dispatch(new_event("Alice")).await;
        let thread = platform.thread_ids().remove(0);

        let reply = dispatcher
            .dispatch(Invocation {
                invoker: "Alice".to_string(),
                thread_id: Some(thread.clone()),
                command: Command::EditEvent(EditEventArgs {
                    date: "6-1".to_string(),
                    hour: 8,
                    minute: "00".to_string(),
                    am_pm: "PM".to_string(),
                    duration: 3,
                    location_id: "voice-2".to_string(),
                    ping_role_id: "role-1".to_string(),
                }),
            })
            .await;

        assert!(reply.text.starts_with("Event edited!"));
        let activities = platform.activities();
        assert_eq!(
            activities[0].start,
            Utc.with_ymd_and_hms(2023, 6, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(activities[0].location_id, "voice-2");
    }
}
