pub mod adapter;
pub mod anchor;
pub mod record;

pub use adapter::{AdapterError, CreatedEvent, EventAdapter, ScheduleChange};
pub use anchor::{Anchor, Embed, EmbedField};
pub use record::EventRecord;
