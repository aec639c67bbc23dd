pub mod codec;
pub mod entry;
pub mod machine;

pub use codec::CodecError;
pub use entry::{Job, RosterEntry};
pub use machine::{Attendance, DesiredStatus, Outcome, Roster};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Unknown job: {0}")]
    InvalidJob(String),
    #[error("Unknown attendance status: {0}")]
    InvalidStatus(String),
}
