use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use coach_core::model::{
    Assessment, ExerciseStatus, FeedbackMessage, HintMessage, ModuleId, ProgressRecord,
    TimelineEntry,
};
use storage::repository::{ProgressStorage, progress_key};

use crate::debounce::Debouncer;
use crate::error::ProgressError;

/// Quiet period between the last mutation and the durable write it triggers.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Per-module progress with write-behind persistence.
///
/// Every mutation updates the in-memory record synchronously and arms one
/// debounced durable write; a burst of mutations inside the window collapses
/// into a single write carrying the record as it stands at fire time. Reads
/// are always served from memory.
///
/// Until [`load`](Self::load) has run, mutations touch only the in-memory
/// record and schedule nothing, so a freshly constructed (empty) store can
/// never clobber a real blob. `load` then replaces the in-memory record
/// wholesale with whatever the blob held.
///
/// Dropping the store cancels a pending write. Call
/// [`flush`](Self::flush) first when the latest state must hit storage.
pub struct ProgressStore {
    key: String,
    storage: Arc<dyn ProgressStorage>,
    record: Arc<Mutex<ProgressRecord>>,
    loaded: bool,
    saver: Debouncer,
}

impl ProgressStore {
    #[must_use]
    pub fn new(module_id: &ModuleId, storage: Arc<dyn ProgressStorage>) -> Self {
        Self {
            key: progress_key(module_id),
            storage,
            record: Arc::new(Mutex::new(ProgressRecord::new())),
            loaded: false,
            saver: Debouncer::new(SAVE_DEBOUNCE),
        }
    }

    /// Overrides the write delay. Pending writes are discarded.
    #[must_use]
    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.saver = Debouncer::new(delay);
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// False until the first [`load`](Self::load) completes.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// True while a debounced write is armed but not yet durable.
    #[must_use]
    pub fn has_pending_write(&self) -> bool {
        self.saver.is_pending()
    }

    /// Reads the stored blob and makes it the live record.
    ///
    /// A missing blob yields an empty record. A blob that fails to parse is
    /// discarded with a warning and also yields an empty record; the learner
    /// always ends up with a usable store, never an error.
    pub async fn load(&mut self) -> ProgressRecord {
        let record = match self.storage.get(&self.key).await {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(key = %self.key, %error, "discarding unparsable progress blob");
                    ProgressRecord::new()
                }
            },
            Ok(None) => ProgressRecord::new(),
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "progress read failed, starting clean");
                ProgressRecord::new()
            }
        };
        *self.lock_record() = record.clone();
        self.loaded = true;
        record
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Marks `index` completed. Idempotent; completion only ever grows.
    pub fn complete_exercise(&mut self, index: usize) {
        self.lock_record().mark_completed(index);
        self.schedule_save();
    }

    /// Overwrites the saved answer text for `index`.
    pub fn save_response(&mut self, index: usize, text: impl Into<String>) {
        self.lock_record().set_response(index, text);
        self.schedule_save();
    }

    /// Overwrites the revealed-hint count for `index`.
    pub fn save_hints(&mut self, index: usize, count: usize) {
        self.lock_record().set_hints_used(index, count);
        self.schedule_save();
    }

    /// Appends one hint-reveal event for `index`.
    pub fn append_hint_message(&mut self, index: usize, message: HintMessage) {
        self.lock_record().push_hint_message(index, message);
        self.schedule_save();
    }

    /// Replaces the feedback slot for `index`; at most one entry survives.
    pub fn replace_feedback_message(&mut self, index: usize, message: FeedbackMessage) {
        self.lock_record().set_feedback_message(index, message);
        self.schedule_save();
    }

    /// Overwrites the latest assessment tag for `index`.
    pub fn save_assessment(&mut self, index: usize, assessment: Assessment) {
        self.lock_record().set_assessment(index, assessment);
        self.schedule_save();
    }

    /// Cancels any pending write and persists the current record now.
    ///
    /// Before `load` this is a no-op: there is nothing durable to protect
    /// and nothing trustworthy to write.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when encoding fails or storage rejects the
    /// write.
    pub async fn flush(&mut self) -> Result<(), ProgressError> {
        self.saver.cancel();
        if !self.loaded {
            return Ok(());
        }
        let json = serde_json::to_string(&*self.lock_record())?;
        self.storage.set(&self.key, &json).await?;
        Ok(())
    }

    /// Explicit full reset: empties the record and deletes the durable blob.
    ///
    /// This is the only path that shrinks the completed set.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when storage rejects the removal.
    pub async fn clear(&mut self) -> Result<(), ProgressError> {
        self.saver.cancel();
        self.lock_record().clear();
        self.storage.remove(&self.key).await?;
        Ok(())
    }

    // ─── Reads ─────────────────────────────────────────────────────────────────

    /// A point-in-time copy of the whole record.
    #[must_use]
    pub fn snapshot(&self) -> ProgressRecord {
        self.lock_record().clone()
    }

    #[must_use]
    pub fn is_completed(&self, index: usize) -> bool {
        self.lock_record().is_completed(index)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.lock_record().completed_count()
    }

    #[must_use]
    pub fn response(&self, index: usize) -> Option<String> {
        self.lock_record().response(index).map(str::to_owned)
    }

    #[must_use]
    pub fn hints_used(&self, index: usize) -> usize {
        self.lock_record().hints_used(index)
    }

    #[must_use]
    pub fn has_feedback(&self, index: usize) -> bool {
        self.lock_record().has_feedback(index)
    }

    #[must_use]
    pub fn assessment(&self, index: usize) -> Option<Assessment> {
        self.lock_record().assessment(index)
    }

    /// Merged hint/feedback conversation for `index`, oldest first.
    #[must_use]
    pub fn timeline(&self, index: usize) -> Vec<TimelineEntry> {
        self.lock_record().timeline(index)
    }

    #[must_use]
    pub fn is_unlocked(&self, current_index: usize, index: usize) -> bool {
        self.lock_record().is_unlocked(current_index, index)
    }

    #[must_use]
    pub fn exercise_status(&self, current_index: usize, index: usize) -> ExerciseStatus {
        self.lock_record().exercise_status(current_index, index)
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn lock_record(&self) -> MutexGuard<'_, ProgressRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_save(&mut self) {
        if !self.loaded {
            return;
        }
        let storage = Arc::clone(&self.storage);
        let record = Arc::clone(&self.record);
        let key = self.key.clone();
        self.saver.call(move || async move {
            // serialize whatever the record holds at fire time, not at
            // schedule time
            let json = {
                let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
                serde_json::to_string(&*guard)
            };
            match json {
                Ok(json) => {
                    if let Err(error) = storage.set(&key, &json).await {
                        tracing::warn!(key = %key, %error, "debounced progress write failed");
                    }
                }
                Err(error) => {
                    tracing::warn!(key = %key, %error, "progress record failed to encode");
                }
            }
        });
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("key", &self.key)
            .field("loaded", &self.loaded)
            .field("completed_count", &self.completed_count())
            .field("pending_write", &self.has_pending_write())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
