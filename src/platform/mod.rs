pub mod memory;
pub mod rest;
pub mod schedule;
pub mod store;

pub use memory::InMemoryPlatform;
pub use rest::RestClient;
pub use schedule::{ScheduleError, ScheduledActivity, SchedulingFacility};
pub use store::{MessageStore, StoreError};
