use crate::errors::PersistenceError;
use crate::models::{Percentage, SubjectRecord};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const STORE_VERSION: u32 = 1;

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/subjects.json")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    version: u32,
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(default)]
    subjects: Vec<StoredRecord>,
}

/// A record as read from disk. Percentages written by older clients may be
/// missing or unparsable (`"NaN"` for 0/0); those load as `None` and are
/// recomputed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    subject_name: String,
    lecture_attended: u32,
    total_lectures: u32,
    #[serde(default, deserialize_with = "lenient_percentage")]
    percentage: Option<Percentage>,
}

fn lenient_percentage<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Percentage>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Durable set of subject records keyed by subject name, kept in a single
/// JSON document. Every write replaces the whole document by renaming a fully
/// flushed temp file over it, so readers see either the old set or the new
/// one.
#[derive(Debug)]
pub struct SubjectStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SubjectStore {
    /// Opens the store at `path`, creating an empty one if none exists.
    ///
    /// Safe to call repeatedly: existing data is never overwritten. A temp
    /// file left behind by an interrupted write is discarded.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| store.io_error(source))?;
        }

        let temp = store.temp_path();
        match fs::remove_file(&temp).await {
            Ok(()) => warn!("discarded interrupted write at {}", temp.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(PersistenceError::Io { path: temp, source });
            }
        }

        match fs::metadata(&store.path).await {
            Ok(_) => debug!("opened store at {}", store.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                store.write_document(&[]).await?;
                info!("created store at {}", store.path.display());
            }
            Err(source) => return Err(store.io_error(source)),
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored record in insertion order. Empty when nothing was saved yet.
    pub async fn load_all(&self) -> Result<Vec<SubjectRecord>, PersistenceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        let document: StoreDocument =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if document.version != STORE_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: document.version,
                expected: STORE_VERSION,
            });
        }

        debug!(saved_at = ?document.saved_at, "read store document");

        let mut seen = HashSet::new();
        let mut subjects = Vec::with_capacity(document.subjects.len());
        for stored in document.subjects {
            let record = SubjectRecord::new(
                stored.subject_name,
                stored.lecture_attended,
                stored.total_lectures,
            );
            if record.lecture_attended > record.total_lectures {
                return Err(self.invalid_record(&record, "attended exceeds total"));
            }
            if !seen.insert(record.subject_name.clone()) {
                return Err(self.invalid_record(&record, "duplicate subject name"));
            }
            if stored.percentage != Some(record.percentage) {
                warn!(
                    subject = %record.subject_name,
                    stored = ?stored.percentage.map(|p| p.to_string()),
                    computed = %record.percentage,
                    "recomputed stale percentage"
                );
            }
            subjects.push(record);
        }

        Ok(subjects)
    }

    /// Replaces the stored set with exactly `records`.
    ///
    /// Later entries with an already-seen subject name overwrite the earlier
    /// entry in place. The replacement is all-or-nothing.
    pub async fn upsert_all(&self, records: &[SubjectRecord]) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let deduped = dedupe_by_name(records);
        self.write_document(&deduped).await?;
        debug!(count = deduped.len(), "replaced subject set");
        Ok(())
    }

    /// Removes the record named `subject_name`. Absent keys are a no-op.
    pub async fn delete_one(&self, subject_name: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await?;
        let before = records.len();
        records.retain(|record| record.subject_name != subject_name);
        if records.len() == before {
            debug!(subject = subject_name, "delete of absent subject ignored");
            return Ok(());
        }
        self.write_document(&records).await?;
        debug!(subject = subject_name, "deleted subject");
        Ok(())
    }

    async fn write_document(&self, subjects: &[SubjectRecord]) -> Result<(), PersistenceError> {
        let document = StoreDocumentRef {
            version: STORE_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            subjects,
        };
        let payload = serde_json::to_vec_pretty(&document).map_err(PersistenceError::Encode)?;

        let temp = self.temp_path();
        let temp_error = |source: std::io::Error| PersistenceError::Io {
            path: temp.clone(),
            source,
        };
        let mut file = fs::File::create(&temp).await.map_err(temp_error)?;
        file.write_all(&payload).await.map_err(temp_error)?;
        file.sync_all().await.map_err(temp_error)?;
        drop(file);

        fs::rename(&temp, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        self.sync_parent_dir().await
    }

    // The rename only survives a crash once the directory entry is flushed.
    #[cfg(unix)]
    async fn sync_parent_dir(&self) -> Result<(), PersistenceError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = fs::File::open(&parent)
            .await
            .map_err(|source| PersistenceError::Io {
                path: parent.clone(),
                source,
            })?;
        dir.sync_all()
            .await
            .map_err(|source| PersistenceError::Io { path: parent, source })
    }

    #[cfg(not(unix))]
    async fn sync_parent_dir(&self) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn invalid_record(&self, record: &SubjectRecord, reason: &str) -> PersistenceError {
        PersistenceError::InvalidRecord {
            path: self.path.clone(),
            subject: record.subject_name.clone(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocumentRef<'a> {
    version: u32,
    saved_at: String,
    subjects: &'a [SubjectRecord],
}

fn dedupe_by_name(records: &[SubjectRecord]) -> Vec<SubjectRecord> {
    let mut out: Vec<SubjectRecord> = Vec::with_capacity(records.len());
    for record in records {
        match out
            .iter_mut()
            .find(|existing| existing.subject_name == record.subject_name)
        {
            Some(existing) => *existing = record.clone(),
            None => out.push(record.clone()),
        }
    }
    out
}
