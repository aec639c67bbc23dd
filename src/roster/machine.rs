//! Registration transitions for an event roster.
//!
//! A participant lives in at most one of the two lists at any time.
//! Every transition clears the prior entry first, so re-issuing a
//! registration never duplicates a participant and changing status
//! never leaves an orphaned entry behind.

use std::str::FromStr;

use crate::roster::RosterError;
use crate::roster::codec;
use crate::roster::entry::{Job, RosterEntry};

/// Which list a registered participant currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attendance {
    Attending,
    Tentative,
}

/// The target state a signup request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredStatus {
    Attending,
    Tentative,
    Unregister,
}

impl FromStr for DesiredStatus {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Attending" => Ok(DesiredStatus::Attending),
            "Tentative" => Ok(DesiredStatus::Tentative),
            "Unregister" => Ok(DesiredStatus::Unregister),
            other => Err(RosterError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Registered(Attendance),
    Unregistered,
}

/// The Attending/Tentative pair for one event, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub attending: Vec<RosterEntry>,
    pub tentative: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(attending: Vec<RosterEntry>, tentative: Vec<RosterEntry>) -> Self {
        Self {
            attending,
            tentative,
        }
    }

    pub fn status_of(&self, identity: &str) -> Option<Attendance> {
        if self.attending.iter().any(|e| e.identity == identity) {
            Some(Attendance::Attending)
        } else if self.tentative.iter().any(|e| e.identity == identity) {
            Some(Attendance::Tentative)
        } else {
            None
        }
    }

    /// Applies one signup request. Any prior entry for `identity` is
    /// removed before the desired state is installed, which makes
    /// repeated identical requests a membership no-op (the job is free
    /// to change on re-registration). Unregistering an absent
    /// participant is also a no-op, not an error.
    pub fn apply_registration(
        &mut self,
        identity: &str,
        job: Job,
        desired: DesiredStatus,
    ) -> Outcome {
        match self.status_of(identity) {
            Some(Attendance::Attending) => codec::remove_entry(&mut self.attending, identity),
            Some(Attendance::Tentative) => codec::remove_entry(&mut self.tentative, identity),
            None => {}
        }

        match desired {
            DesiredStatus::Unregister => Outcome::Unregistered,
            DesiredStatus::Attending => {
                self.attending.push(RosterEntry::new(identity, job));
                Outcome::Registered(Attendance::Attending)
            }
            DesiredStatus::Tentative => {
                self.tentative.push(RosterEntry::new(identity, job));
                Outcome::Registered(Attendance::Tentative)
            }
        }
    }
}
