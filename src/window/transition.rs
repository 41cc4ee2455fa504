use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a stored record. Only used to target a transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a record: upcoming → ongoing → finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Upcoming,
    Ongoing,
    Finished,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Upcoming => write!(f, "upcoming"),
            RecordStatus::Ongoing => write!(f, "ongoing"),
            RecordStatus::Finished => write!(f, "finished"),
        }
    }
}

/// A named status change handed to the transition executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    UpcomingToOngoing,
    OngoingToFinished,
}

impl Transition {
    /// The transition identifier understood by the executor.
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::UpcomingToOngoing => "upcoming_to_ongoing",
            Transition::OngoingToFinished => "ongoing_to_finished",
        }
    }

    /// Status a record must be in for this transition to apply.
    pub fn source(self) -> RecordStatus {
        match self {
            Transition::UpcomingToOngoing => RecordStatus::Upcoming,
            Transition::OngoingToFinished => RecordStatus::Ongoing,
        }
    }

    /// Status a record is in once the transition has applied.
    pub fn target(self) -> RecordStatus {
        match self {
            Transition::UpcomingToOngoing => RecordStatus::Ongoing,
            Transition::OngoingToFinished => RecordStatus::Finished,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
