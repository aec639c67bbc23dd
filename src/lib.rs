pub mod commands;
pub mod config;
pub mod event;
pub mod platform;
pub mod roster;
pub mod timekeeping;

pub use commands::{Command, Dispatcher, Invocation, Reply};
pub use event::{Anchor, Embed, EventAdapter, EventRecord};
pub use roster::{DesiredStatus, Job, Outcome, Roster, RosterEntry};
pub use timekeeping::{TimeResolver, TimezoneTable};
