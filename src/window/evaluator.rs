use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::transition::Transition;
use crate::error::{EvaluationError, WindowBound};

/// Minutes before `start` during which a record already counts as ongoing.
pub const LOOKAHEAD_MINUTES: i64 = 5;

/// Minutes after `end` before a record counts as finished.
pub const GRACE_PERIOD_MINUTES: i64 = 5;

/// The half-open `[start, end)` interval during which a record is active.
///
/// Fields are public so stored bounds can be carried around as-is;
/// [`TransitionEvaluator::evaluate`] rejects any window whose start is not
/// strictly before its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Builds a validated window.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, EvaluationError> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    /// Builds a window from bounds that may be absent in the record store.
    ///
    /// A missing start is reported before a missing end.
    pub fn from_parts(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, EvaluationError> {
        let start = start.ok_or(EvaluationError::MissingInput {
            bound: WindowBound::Start,
        })?;
        let end = end.ok_or(EvaluationError::MissingInput {
            bound: WindowBound::End,
        })?;
        Self::new(start, end)
    }

    pub fn validate(&self) -> Result<(), EvaluationError> {
        if self.start >= self.end {
            return Err(EvaluationError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// True when `now` falls inside `[start, end)`.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }
}

/// What should happen to a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDecision {
    /// Nothing to do yet (too early, or still inside the grace period).
    None,
    /// The record has started or starts within the lookahead.
    ToOngoing,
    /// The record ended at least a grace period ago.
    ToFinished,
}

impl TransitionDecision {
    /// The executor transition this decision maps to, if any.
    pub fn transition(self) -> Option<Transition> {
        match self {
            TransitionDecision::None => None,
            TransitionDecision::ToOngoing => Some(Transition::UpcomingToOngoing),
            TransitionDecision::ToFinished => Some(Transition::OngoingToFinished),
        }
    }
}

impl fmt::Display for TransitionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionDecision::None => write!(f, "none"),
            TransitionDecision::ToOngoing => write!(f, "to_ongoing"),
            TransitionDecision::ToFinished => write!(f, "to_finished"),
        }
    }
}

/// Where `now` sits relative to a window. Kept separate from the decision
/// so the branch order can be exercised on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    before_start: bool,
    within: bool,
    starting_soon: bool,
    finished_grace: bool,
}

impl Position {
    fn locate(now: DateTime<Utc>, window: &TimeWindow) -> Self {
        let until_start = window.start - now;
        let since_end = now - window.end;

        Self {
            before_start: now < window.start,
            within: window.contains(now),
            starting_soon: until_start > Duration::zero()
                && until_start <= Duration::minutes(LOOKAHEAD_MINUTES),
            finished_grace: since_end >= Duration::minutes(GRACE_PERIOD_MINUTES),
        }
    }

    // First match wins: ongoing-or-imminent is checked before finished.
    fn decide(self) -> TransitionDecision {
        if self.before_start && !self.starting_soon {
            TransitionDecision::None
        } else if self.within || self.starting_soon {
            TransitionDecision::ToOngoing
        } else if self.finished_grace {
            TransitionDecision::ToFinished
        } else {
            TransitionDecision::None
        }
    }
}

/// Classifies an instant against a record's window.
pub struct TransitionEvaluator;

impl TransitionEvaluator {
    /// Decide whether a record with the given window should advance at `now`.
    ///
    /// - Before `start - 5min`: `None`.
    /// - From `start - 5min` (exclusive) until `end` (exclusive): `ToOngoing`.
    /// - From `end` until `end + 5min` (exclusive): `None`.
    /// - From `end + 5min` on: `ToFinished`.
    ///
    /// Fails with [`EvaluationError::InvalidWindow`] when `start >= end`.
    pub fn evaluate(
        now: DateTime<Utc>,
        window: TimeWindow,
    ) -> Result<TransitionDecision, EvaluationError> {
        window.validate()?;
        Ok(Position::locate(now, &window).decide())
    }
}
