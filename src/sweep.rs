use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CollectionSchema;
use crate::error::{FailureKind, SweepError};
use crate::store::{ApplyResult, DryRun, RecordSource, SourceRecord, TransitionExecutor};
use crate::window::{RecordId, TimeWindow, Transition, TransitionEvaluator};

/// What happened to one record during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The evaluator decided nothing should change.
    Unchanged,
    Applied(Transition),
    /// The record was already in the transition's target status.
    AlreadyApplied(Transition),
    /// Dry run: the transition would have been applied.
    Planned(Transition),
    Failed(FailureKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub record_id: RecordId,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub name: String,
    pub records: Vec<RecordReport>,
}

/// Counts per outcome class across a whole sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub evaluated: usize,
    pub unchanged: usize,
    pub applied: usize,
    pub already_applied: usize,
    pub planned: usize,
    pub failed: usize,
}

/// Structured record produced by one sweep pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub id: String,
    /// The single instant every record in this pass was evaluated against.
    pub now: DateTime<Utc>,
    pub dry_run: bool,
    pub collections: Vec<CollectionReport>,
}

impl SweepReport {
    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for report in self.collections.iter().flat_map(|c| &c.records) {
            summary.evaluated += 1;
            match report.outcome {
                RecordOutcome::Unchanged => summary.unchanged += 1,
                RecordOutcome::Applied(_) => summary.applied += 1,
                RecordOutcome::AlreadyApplied(_) => summary.already_applied += 1,
                RecordOutcome::Planned(_) => summary.planned += 1,
                RecordOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Every failed record with the collection it belongs to.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RecordId, &FailureKind)> {
        self.collections.iter().flat_map(|c| {
            c.records.iter().filter_map(move |r| match &r.outcome {
                RecordOutcome::Failed(kind) => Some((c.name.as_str(), &r.record_id, kind)),
                _ => None,
            })
        })
    }
}

/// Drives every configured collection through the evaluator at a fixed instant.
pub struct Sweeper {
    collections: Vec<CollectionSchema>,
    dry_run: bool,
}

impl Sweeper {
    pub fn new(collections: Vec<CollectionSchema>) -> Self {
        Self {
            collections,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pass over all collections, evaluating every record against `now`.
    ///
    /// A record that fails evaluation or whose transition is refused is
    /// reported as [`RecordOutcome::Failed`] and the pass moves on. A
    /// collection that cannot be loaded, or holds no records, aborts the pass.
    pub fn run<S>(&self, store: &mut S, now: DateTime<Utc>) -> Result<SweepReport, SweepError>
    where
        S: RecordSource + TransitionExecutor,
    {
        let collections = if self.dry_run {
            let mut dry = DryRun::new(&*store);
            let collections = self.sweep_all(&mut dry, now)?;
            debug!(planned = dry.planned().len(), "Dry run left the store untouched");
            collections
        } else {
            self.sweep_all(store, now)?
        };

        Ok(SweepReport {
            id: Uuid::new_v4().to_string(),
            now,
            dry_run: self.dry_run,
            collections,
        })
    }

    fn sweep_all<S>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<Vec<CollectionReport>, SweepError>
    where
        S: RecordSource + TransitionExecutor,
    {
        self.collections
            .iter()
            .map(|schema| sweep_collection(&mut *store, schema, now))
            .collect()
    }
}

fn sweep_collection<S>(
    store: &mut S,
    schema: &CollectionSchema,
    now: DateTime<Utc>,
) -> Result<CollectionReport, SweepError>
where
    S: RecordSource + TransitionExecutor,
{
    let records = store.load(schema)?;
    if records.is_empty() {
        return Err(SweepError::EmptyCollection(schema.name.clone()));
    }
    info!(collection = %schema.name, records = records.len(), "Sweeping collection");

    let records = records
        .into_iter()
        .map(|record| {
            let outcome = process_record(&mut *store, schema, &record, now);
            if let RecordOutcome::Failed(kind) = &outcome {
                warn!(collection = %schema.name, record = %record.id, "{kind}");
            }
            RecordReport {
                record_id: record.id,
                outcome,
            }
        })
        .collect();

    Ok(CollectionReport {
        name: schema.name.clone(),
        records,
    })
}

fn process_record<E: TransitionExecutor>(
    executor: &mut E,
    schema: &CollectionSchema,
    record: &SourceRecord,
    now: DateTime<Utc>,
) -> RecordOutcome {
    let decision = match TimeWindow::from_parts(record.start, record.end)
        .and_then(|window| TransitionEvaluator::evaluate(now, window))
    {
        Ok(decision) => decision,
        Err(err) => return RecordOutcome::Failed(err.into()),
    };
    debug!(record = %record.id, %decision, "Evaluated window");

    let Some(transition) = decision.transition() else {
        return RecordOutcome::Unchanged;
    };

    match executor.apply(schema, &record.id, transition) {
        Ok(ApplyResult::Applied) => {
            info!(collection = %schema.name, record = %record.id, %transition, "Applied transition");
            RecordOutcome::Applied(transition)
        }
        Ok(ApplyResult::AlreadyApplied) => RecordOutcome::AlreadyApplied(transition),
        Ok(ApplyResult::Planned) => RecordOutcome::Planned(transition),
        Err(err) => RecordOutcome::Failed(FailureKind::Executor(err.to_string())),
    }
}
