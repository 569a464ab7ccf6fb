//! Experiment storage API.

use crate::types::{ExperimentHeader, ExperimentRecord};
use crate::{ResultsError, ResultsResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Opaque persistence boundary used by the engine.
pub trait ExperimentStore: Send + Sync {
    fn save(&self, record: &ExperimentRecord) -> ResultsResult<()>;

    fn load(&self, id: &str) -> ResultsResult<ExperimentRecord>;

    /// Stored experiments, oldest first.
    fn list(&self) -> ResultsResult<Vec<ExperimentHeader>>;

    fn delete(&self, id: &str) -> ResultsResult<()>;
}

/// One pretty-printed JSON file per experiment under `root_dir`.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    root_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &std::path::Path {
        &self.root_dir
    }

    fn record_path(&self, id: &str) -> ResultsResult<PathBuf> {
        validate_id(id)?;
        Ok(self.root_dir.join(format!("{id}.json")))
    }
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
fn validate_id(id: &str) -> ResultsResult<()> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ResultsError::InvalidId { id: id.to_string() })
    }
}

impl ExperimentStore for JsonFileStore {
    fn save(&self, record: &ExperimentRecord) -> ResultsResult<()> {
        let path = self.record_path(&record.id)?;
        fs::create_dir_all(&self.root_dir)?;

        let json = serde_json::to_string_pretty(record)?;
        // Write-then-rename so a crash never leaves a truncated record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(id = %record.id, path = %path.display(), "record written");
        Ok(())
    }

    fn load(&self, id: &str) -> ResultsResult<ExperimentRecord> {
        let path = self.record_path(id)?;
        if !path.exists() {
            return Err(ResultsError::ExperimentNotFound { id: id.to_string() });
        }
        let content = fs::read_to_string(path)?;
        let record = serde_json::from_str(&content)?;
        Ok(record)
    }

    fn list(&self) -> ResultsResult<Vec<ExperimentHeader>> {
        let mut headers = Vec::new();

        if !self.root_dir.exists() {
            return Ok(headers);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.load(id) {
                Ok(record) => headers.push(ExperimentHeader::from(&record)),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record"),
            }
        }

        headers.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(headers)
    }

    fn delete(&self, id: &str) -> ResultsResult<()> {
        let path = self.record_path(id)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-process store for hosts without a filesystem and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, ExperimentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> ResultsError {
        ResultsError::Unavailable {
            message: "memory store lock poisoned".to_string(),
        }
    }
}

impl ExperimentStore for MemoryStore {
    fn save(&self, record: &ExperimentRecord) -> ResultsResult<()> {
        validate_id(&record.id)?;
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> ResultsResult<ExperimentRecord> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| ResultsError::ExperimentNotFound { id: id.to_string() })
    }

    fn list(&self) -> ResultsResult<Vec<ExperimentHeader>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let mut headers: Vec<_> = records.values().map(ExperimentHeader::from).collect();
        headers.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(headers)
    }

    fn delete(&self, id: &str) -> ResultsResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.remove(id);
        Ok(())
    }
}
