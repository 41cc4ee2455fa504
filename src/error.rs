use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::window::{RecordStatus, Transition};

/// Why a single record could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("invalid window: start {start} is not before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("missing {bound} timestamp")]
    MissingInput { bound: WindowBound },
}

/// Which side of a window a timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBound {
    Start,
    End,
}

impl fmt::Display for WindowBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowBound::Start => write!(f, "start"),
            WindowBound::End => write!(f, "end"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("There are no records in collection `{0}`")]
    EmptyCollection(String),

    #[error("Collection `{0}` not found in the record store")]
    UnknownCollection(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Cannot apply {transition} to record {record}: status is {status}")]
    InvalidTransition {
        record: String,
        transition: Transition,
        status: RecordStatus,
    },

    #[error("Record {record}: field `{field}` is not an RFC 3339 timestamp: {value}")]
    Timestamp {
        record: String,
        field: String,
        value: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Classifies a per-record failure in a sweep report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The record's window could not be evaluated (missing or inverted bounds).
    Evaluation(String),
    /// The executor refused or failed to apply the transition.
    Executor(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Evaluation(msg) => write!(f, "Evaluation failure: {msg}"),
            FailureKind::Executor(msg) => write!(f, "Executor failure: {msg}"),
        }
    }
}

impl From<EvaluationError> for FailureKind {
    fn from(err: EvaluationError) -> Self {
        FailureKind::Evaluation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_display() {
        let err = EvaluationError::MissingInput {
            bound: WindowBound::End,
        };
        assert_eq!(err.to_string(), "missing end timestamp");
    }

    #[test]
    fn invalid_transition_display() {
        let err = SweepError::InvalidTransition {
            record: "abc".into(),
            transition: Transition::UpcomingToOngoing,
            status: RecordStatus::Finished,
        };
        assert_eq!(
            err.to_string(),
            "Cannot apply upcoming_to_ongoing to record abc: status is finished"
        );
    }

    #[test]
    fn failure_kind_display() {
        let eval = FailureKind::from(EvaluationError::MissingInput {
            bound: WindowBound::Start,
        });
        assert_eq!(eval.to_string(), "Evaluation failure: missing start timestamp");

        let exec = FailureKind::Executor("Record not found: x".into());
        assert_eq!(exec.to_string(), "Executor failure: Record not found: x");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SweepError>();
        assert_send_sync::<EvaluationError>();
    }
}
