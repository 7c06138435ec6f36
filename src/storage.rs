use crate::lead::LeadRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_NAMESPACE: &str = "impactiq_leads";

/// A lead kept on this machine because no network transport accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLead {
    #[serde(flatten)]
    pub lead: LeadRecord,
    /// ISO-8601 timestamp taken when the record was written.
    pub submitted_at: String,
}

impl StoredLead {
    pub fn new(lead: LeadRecord, at: DateTime<Utc>) -> Self {
        Self {
            lead,
            submitted_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Lead store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Lead store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Lead store lock poisoned")]
    Poisoned,
}

/// Last-resort persistence for leads.
pub trait LeadStore: Send + Sync {
    /// Append a lead and return the number of stored leads afterwards.
    fn append(&self, entry: StoredLead) -> Result<usize, StoreError>;

    fn load(&self) -> Result<Vec<StoredLead>, StoreError>;
}

/// Stores the lead list as one JSON array in `<directory>/<namespace>.json`.
///
/// Every append re-reads the whole file, writes the new list to a sibling
/// `.json.tmp` file and renames it over the original, so a failed write
/// never truncates the stored list. Writers are not coordinated; callers
/// serialize submissions.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(directory: P, namespace: &str) -> Self {
        Self {
            path: directory.as_ref().join(format!("{namespace}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LeadStore for JsonFileStore {
    fn append(&self, entry: StoredLead) -> Result<usize, StoreError> {
        let mut leads = self.load()?;
        leads.push(entry);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string(&leads)?;
        let temp_path = self.temp_path();
        std::fs::write(&temp_path, content).map_err(|e| StoreError::Io {
            path: temp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        log::debug!("Stored lead locally in {}", self.path.display());
        Ok(leads.len())
    }

    fn load(&self) -> Result<Vec<StoredLead>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-process store, useful when embedding the pipeline without a disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leads: Mutex<Vec<StoredLead>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeadStore for MemoryStore {
    fn append(&self, entry: StoredLead) -> Result<usize, StoreError> {
        let mut leads = self.leads.lock().map_err(|_| StoreError::Poisoned)?;
        leads.push(entry);
        Ok(leads.len())
    }

    fn load(&self) -> Result<Vec<StoredLead>, StoreError> {
        let leads = self.leads.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(leads.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::complete_lead;
    use chrono::TimeZone;

    #[test]
    fn test_stored_lead_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        let entry = StoredLead::new(complete_lead(), at);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["firstName"], "Maria");
        assert_eq!(json["projectsPerMonth"], "6-15");
        assert_eq!(json["submittedAt"], "2024-03-09T14:30:00.000Z");
    }

    #[test]
    fn test_append_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), DEFAULT_NAMESPACE);
        std::fs::write(store.temp_path(), "stale half-written [").unwrap();

        store.append(StoredLead::new(complete_lead(), Utc::now())).unwrap();
        store.append(StoredLead::new(complete_lead(), Utc::now())).unwrap();

        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap().len(), 2);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("impactiq_leads.json")]);
    }

    #[test]
    fn test_failed_write_keeps_previous_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), DEFAULT_NAMESPACE);
        store.append(StoredLead::new(complete_lead(), Utc::now())).unwrap();

        // A directory in the way makes the temp-file write fail.
        std::fs::create_dir(store.temp_path()).unwrap();
        let err = store
            .append(StoredLead::new(complete_lead(), Utc::now()))
            .unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), DEFAULT_NAMESPACE);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"), DEFAULT_NAMESPACE);

        let first = StoredLead::new(complete_lead(), Utc::now());
        assert_eq!(store.append(first.clone()).unwrap(), 1);

        let mut other = complete_lead();
        other.email = "second@example.com".to_string();
        let second = StoredLead::new(other, Utc::now());
        assert_eq!(store.append(second.clone()).unwrap(), 2);

        assert_eq!(store.load().unwrap(), vec![first, second]);
        assert!(store.path().ends_with("nested/impactiq_leads.json"));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), "leads");
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Json(_))));
        assert!(store.append(StoredLead::new(complete_lead(), Utc::now())).is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.append(StoredLead::new(complete_lead(), Utc::now())).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
