use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApplyResult, RecordSource, SourceRecord, TransitionExecutor};
use crate::config::CollectionSchema;
use crate::error::SweepError;
use crate::window::{RecordId, RecordStatus, Transition};

/// One record as persisted in the store document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub status: RecordStatus,
    /// Named field values. Only the schema's start/end fields are read;
    /// everything else is carried through untouched.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    collections: BTreeMap<String, Vec<StoredRecord>>,
}

/// Record store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    document: StoreDocument,
    dirty: bool,
}

impl JsonStore {
    /// Reads the store document at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SweepError> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)?;
        let document = serde_json::from_str(&contents)?;
        Ok(Self {
            path,
            document,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the document back if any transition changed it.
    ///
    /// The new contents go to a sibling temp file first and are renamed over
    /// the original, so a crash never leaves a half-written store.
    pub fn save(&mut self) -> Result<bool, SweepError> {
        if !self.dirty {
            return Ok(false);
        }
        let json = serde_json::to_string_pretty(&self.document)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        Ok(true)
    }

    #[cfg(test)]
    pub fn status_of(&self, collection: &str, id: &str) -> Option<RecordStatus> {
        self.document
            .collections
            .get(collection)?
            .iter()
            .find(|r| r.id.as_str() == id)
            .map(|r| r.status)
    }

    fn find_mut(&mut self, collection: &str, id: &RecordId) -> Option<&mut StoredRecord> {
        self.document
            .collections
            .get_mut(collection)?
            .iter_mut()
            .find(|r| &r.id == id)
    }
}

// Absent and null both mean "no value"; anything else must be an RFC 3339 string.
fn read_timestamp(
    record: &StoredRecord,
    field: &str,
) -> Result<Option<DateTime<Utc>>, SweepError> {
    let invalid = |value: String| SweepError::Timestamp {
        record: record.id.to_string(),
        field: field.to_string(),
        value,
    };

    match record.fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| invalid(raw.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}

impl RecordSource for JsonStore {
    fn load(&self, collection: &CollectionSchema) -> Result<Vec<SourceRecord>, SweepError> {
        let records = self
            .document
            .collections
            .get(&collection.name)
            .ok_or_else(|| SweepError::UnknownCollection(collection.name.clone()))?;

        records
            .iter()
            .map(|record| -> Result<SourceRecord, SweepError> {
                Ok(SourceRecord {
                    id: record.id.clone(),
                    start: read_timestamp(record, &collection.start_field)?,
                    end: read_timestamp(record, &collection.end_field)?,
                })
            })
            .collect()
    }
}

impl TransitionExecutor for JsonStore {
    fn apply(
        &mut self,
        collection: &CollectionSchema,
        id: &RecordId,
        transition: Transition,
    ) -> Result<ApplyResult, SweepError> {
        let record = self
            .find_mut(&collection.name, id)
            .ok_or_else(|| SweepError::RecordNotFound(id.to_string()))?;

        if record.status == transition.target() {
            return Ok(ApplyResult::AlreadyApplied);
        }
        if record.status != transition.source() {
            return Err(SweepError::InvalidTransition {
                record: id.to_string(),
                transition,
                status: record.status,
            });
        }

        record.status = transition.target();
        self.dirty = true;
        Ok(ApplyResult::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STORE: &str = r#"{
        "collections": {
            "events": [
                {
                    "id": "ev-1",
                    "status": "upcoming",
                    "fields": {
                        "Name": "Opening ceremony",
                        "Start Date": "2025-02-05T10:00:00Z",
                        "End Date": "2025-02-05T12:00:00+01:00"
                    }
                },
                {
                    "id": "ev-2",
                    "status": "ongoing",
                    "fields": { "Start Date": null }
                }
            ],
            "transmissions": [
                { "id": "tx-1", "status": "finished", "fields": {} }
            ],
            "empty": []
        }
    }"#;

    fn write_store(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn load_resolves_schema_fields() {
        let file = write_store(STORE);
        let store = JsonStore::open(file.path()).unwrap();

        let records = store.load(&CollectionSchema::new("events")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId::new("ev-1"));
        assert_eq!(records[0].start, Some(ts("2025-02-05T10:00:00Z")));
        assert_eq!(records[0].end, Some(ts("2025-02-05T11:00:00Z")));
        assert_eq!(records[1].start, None);
        assert_eq!(records[1].end, None);
    }

    #[test]
    fn load_with_custom_field_names() {
        let file = write_store(STORE);
        let store = JsonStore::open(file.path()).unwrap();
        let schema = CollectionSchema {
            name: "events".into(),
            start_field: "Name".into(),
            end_field: "End Date".into(),
        };

        let err = store.load(&schema).unwrap_err();
        assert!(matches!(err, SweepError::Timestamp { ref field, .. } if field == "Name"));
    }

    #[test]
    fn load_unknown_collection_fails() {
        let file = write_store(STORE);
        let store = JsonStore::open(file.path()).unwrap();

        let err = store.load(&CollectionSchema::new("bookings")).unwrap_err();
        assert!(matches!(err, SweepError::UnknownCollection(name) if name == "bookings"));
    }

    #[test]
    fn non_string_timestamp_is_rejected() {
        let file = write_store(
            r#"{"collections":{"events":[{"id":"a","status":"upcoming","fields":{"Start Date":42}}]}}"#,
        );
        let store = JsonStore::open(file.path()).unwrap();

        let err = store.load(&CollectionSchema::new("events")).unwrap_err();
        assert!(matches!(err, SweepError::Timestamp { value, .. } if value == "42"));
    }

    #[test]
    fn apply_advances_status_and_saves() {
        let file = write_store(STORE);
        let mut store = JsonStore::open(file.path()).unwrap();
        let events = CollectionSchema::new("events");

        let result = store
            .apply(&events, &RecordId::new("ev-1"), Transition::UpcomingToOngoing)
            .unwrap();
        assert_eq!(result, ApplyResult::Applied);
        assert_eq!(
            store.status_of("events", "ev-1"),
            Some(RecordStatus::Ongoing)
        );
        assert!(store.save().unwrap());
        assert!(!store.save().unwrap());

        let reopened = JsonStore::open(file.path()).unwrap();
        assert_eq!(
            reopened.status_of("events", "ev-1"),
            Some(RecordStatus::Ongoing)
        );
        // Unread fields survive the rewrite.
        let records = reopened.load(&events).unwrap();
        assert_eq!(records[0].start, Some(ts("2025-02-05T10:00:00Z")));
    }

    #[test]
    fn apply_to_target_status_is_already_applied() {
        let file = write_store(STORE);
        let mut store = JsonStore::open(file.path()).unwrap();

        let result = store
            .apply(
                &CollectionSchema::new("events"),
                &RecordId::new("ev-2"),
                Transition::UpcomingToOngoing,
            )
            .unwrap();
        assert_eq!(result, ApplyResult::AlreadyApplied);
        assert!(!store.save().unwrap());
    }

    #[test]
    fn apply_from_wrong_status_is_invalid() {
        let file = write_store(STORE);
        let mut store = JsonStore::open(file.path()).unwrap();

        let err = store
            .apply(
                &CollectionSchema::new("transmissions"),
                &RecordId::new("tx-1"),
                Transition::UpcomingToOngoing,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SweepError::InvalidTransition {
                status: RecordStatus::Finished,
                ..
            }
        ));
    }

    #[test]
    fn apply_unknown_record_fails() {
        let file = write_store(STORE);
        let mut store = JsonStore::open(file.path()).unwrap();

        let err = store
            .apply(
                &CollectionSchema::new("events"),
                &RecordId::new("nope"),
                Transition::OngoingToFinished,
            )
            .unwrap_err();
        assert!(matches!(err, SweepError::RecordNotFound(id) if id == "nope"));
    }

    #[test]
    fn apply_does_not_reach_into_other_collections() {
        let file = write_store(STORE);
        let mut store = JsonStore::open(file.path()).unwrap();

        let err = store
            .apply(
                &CollectionSchema::new("transmissions"),
                &RecordId::new("ev-1"),
                Transition::UpcomingToOngoing,
            )
            .unwrap_err();
        assert!(matches!(err, SweepError::RecordNotFound(id) if id == "ev-1"));
        assert_eq!(
            store.status_of("events", "ev-1"),
            Some(RecordStatus::Upcoming)
        );
    }

    #[test]
    fn same_id_in_two_collections_is_kept_apart() {
        let file = write_store(
            r#"{"collections":{
                "events":[{"id":"1","status":"ongoing"}],
                "transmissions":[{"id":"1","status":"upcoming"}]
            }}"#,
        );
        let mut store = JsonStore::open(file.path()).unwrap();

        let result = store
            .apply(
                &CollectionSchema::new("transmissions"),
                &RecordId::new("1"),
                Transition::UpcomingToOngoing,
            )
            .unwrap();
        assert_eq!(result, ApplyResult::Applied);
        assert_eq!(
            store.status_of("transmissions", "1"),
            Some(RecordStatus::Ongoing)
        );
        assert_eq!(store.status_of("events", "1"), Some(RecordStatus::Ongoing));

        let result = store
            .apply(
                &CollectionSchema::new("events"),
                &RecordId::new("1"),
                Transition::OngoingToFinished,
            )
            .unwrap();
        assert_eq!(result, ApplyResult::Applied);
        assert_eq!(
            store.status_of("events", "1"),
            Some(RecordStatus::Finished)
        );
        assert_eq!(
            store.status_of("transmissions", "1"),
            Some(RecordStatus::Ongoing)
        );
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonStore::open(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SweepError::Io(_)));
    }

    #[test]
    fn open_malformed_file_is_json_error() {
        let file = write_store("{ not json");
        let err = JsonStore::open(file.path()).unwrap_err();
        assert!(matches!(err, SweepError::Json(_)));
    }
}
