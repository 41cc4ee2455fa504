//! Seams between the sweeper and wherever records actually live.
//!
//! [`RecordSource`] hands out the bounds of every record in a collection,
//! [`TransitionExecutor`] applies a named transition to one record of a
//! collection. Ids are only unique within their collection.
//! [`JsonStore`] implements both over a single JSON document; [`DryRun`]
//! wraps any source and only records what would have been applied.

mod json;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CollectionSchema;
use crate::error::SweepError;
use crate::window::{RecordId, Transition};

pub use json::JsonStore;

/// A record as seen by the sweeper: an id plus whatever bounds the store had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: RecordId,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// What the executor did with a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyResult {
    Applied,
    /// The record was already in the target status.
    AlreadyApplied,
    /// Dry run: nothing was changed.
    Planned,
}

pub trait RecordSource {
    /// Loads every record of `collection`, resolving bounds through its schema.
    fn load(&self, collection: &CollectionSchema) -> Result<Vec<SourceRecord>, SweepError>;
}

pub trait TransitionExecutor {
    fn apply(
        &mut self,
        collection: &CollectionSchema,
        id: &RecordId,
        transition: Transition,
    ) -> Result<ApplyResult, SweepError>;
}

/// Reads through to `inner` and records transitions instead of applying them.
pub struct DryRun<'a, S> {
    inner: &'a S,
    planned: Vec<(String, RecordId, Transition)>,
}

impl<'a, S: RecordSource> DryRun<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            planned: Vec::new(),
        }
    }

    pub fn planned(&self) -> &[(String, RecordId, Transition)] {
        &self.planned
    }
}

impl<S: RecordSource> RecordSource for DryRun<'_, S> {
    fn load(&self, collection: &CollectionSchema) -> Result<Vec<SourceRecord>, SweepError> {
        self.inner.load(collection)
    }
}

impl<S: RecordSource> TransitionExecutor for DryRun<'_, S> {
    fn apply(
        &mut self,
        collection: &CollectionSchema,
        id: &RecordId,
        transition: Transition,
    ) -> Result<ApplyResult, SweepError> {
        self.planned
            .push((collection.name.clone(), id.clone(), transition));
        Ok(ApplyResult::Planned)
    }
}
