use crate::attendance::{build_record, increment};
use crate::errors::{PersistenceError, TrackerError, ValidationError};
use crate::models::{SubjectForm, SubjectRecord};
use crate::storage::SubjectStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// What the page currently shows: the cached records and the subject being
/// edited, if any.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub subjects: Vec<SubjectRecord>,
    pub editing: Option<String>,
}

/// Application state shared by the handlers.
///
/// `view` is a read-through cache of the store. Mutations compute the next
/// full set, persist it, and only then update `view`, so a failed save leaves
/// the previously loaded records on screen.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SubjectStore>,
    pub view: Arc<Mutex<ViewState>>,
}

impl AppState {
    pub async fn load(store: SubjectStore) -> Result<Self, PersistenceError> {
        let subjects = store.load_all().await?;
        info!(count = subjects.len(), "loaded subjects");
        Ok(Self {
            store: Arc::new(store),
            view: Arc::new(Mutex::new(ViewState {
                subjects,
                editing: None,
            })),
        })
    }

    pub async fn snapshot(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    pub async fn subjects(&self) -> Vec<SubjectRecord> {
        self.view.lock().await.subjects.clone()
    }

    pub async fn editing(&self) -> Option<String> {
        self.view.lock().await.editing.clone()
    }

    /// Adds a subject. Resubmitting an existing name replaces that record.
    pub async fn submit_new(&self, form: &SubjectForm) -> Result<SubjectRecord, TrackerError> {
        let record = build_record(form)?;
        let mut view = self.view.lock().await;

        let mut next = view.subjects.clone();
        match next
            .iter_mut()
            .find(|existing| existing.subject_name == record.subject_name)
        {
            Some(existing) => *existing = record.clone(),
            None => next.push(record.clone()),
        }

        self.commit(&mut view, next).await?;
        info!(subject = %record.subject_name, percentage = %record.percentage, "saved subject");
        Ok(record)
    }

    /// Replaces the record for `key` in place. The name cannot change.
    pub async fn submit_edit(
        &self,
        key: &str,
        form: &SubjectForm,
    ) -> Result<SubjectRecord, TrackerError> {
        let submitted = form.subject_name.trim();
        if !submitted.is_empty() && submitted != key {
            let mut errors = ValidationError::default();
            errors.push("subjectName", "Subject name cannot change while editing");
            return Err(errors.into());
        }
        let keyed = SubjectForm {
            subject_name: key.to_string(),
            ..form.clone()
        };
        let record = build_record(&keyed)?;

        let mut view = self.view.lock().await;
        let position = view
            .subjects
            .iter()
            .position(|existing| existing.subject_name == key)
            .ok_or_else(|| TrackerError::UnknownSubject(key.to_string()))?;

        let mut next = view.subjects.clone();
        next[position] = record.clone();

        self.commit(&mut view, next).await?;
        if view.editing.as_deref() == Some(key) {
            view.editing = None;
        }
        info!(subject = %record.subject_name, percentage = %record.percentage, "edited subject");
        Ok(record)
    }

    /// Counts one more lecture for `key`, attended or skipped.
    pub async fn increment_attendance(
        &self,
        key: &str,
        attended: bool,
    ) -> Result<SubjectRecord, TrackerError> {
        let mut view = self.view.lock().await;
        let position = view
            .subjects
            .iter()
            .position(|existing| existing.subject_name == key)
            .ok_or_else(|| TrackerError::UnknownSubject(key.to_string()))?;

        let record = increment(&view.subjects[position], attended);
        let mut next = view.subjects.clone();
        next[position] = record.clone();

        self.commit(&mut view, next).await?;
        info!(
            subject = key,
            attended,
            percentage = %record.percentage,
            "recorded lecture"
        );
        Ok(record)
    }

    /// Removes `key`. Deleting an unknown subject is not an error.
    pub async fn delete_subject(&self, key: &str) -> Result<(), TrackerError> {
        let mut view = self.view.lock().await;
        self.store.delete_one(key).await.inspect_err(|err| {
            warn!(subject = key, "delete failed: {err}");
        })?;

        view.subjects.retain(|record| record.subject_name != key);
        if view.editing.as_deref() == Some(key) {
            view.editing = None;
        }
        info!(subject = key, "deleted subject");
        Ok(())
    }

    pub async fn begin_edit(&self, key: &str) -> Result<SubjectRecord, TrackerError> {
        let mut view = self.view.lock().await;
        let record = view
            .subjects
            .iter()
            .find(|existing| existing.subject_name == key)
            .cloned()
            .ok_or_else(|| TrackerError::UnknownSubject(key.to_string()))?;
        view.editing = Some(key.to_string());
        Ok(record)
    }

    pub async fn cancel_edit(&self) {
        self.view.lock().await.editing = None;
    }

    async fn commit(
        &self,
        view: &mut ViewState,
        next: Vec<SubjectRecord>,
    ) -> Result<(), PersistenceError> {
        self.store.upsert_all(&next).await.inspect_err(|err| {
            warn!("save failed, keeping previous subjects: {err}");
        })?;
        view.subjects = next;
        Ok(())
    }
}
