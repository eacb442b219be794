use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::assessment::Assessment;
use crate::model::message::{FeedbackMessage, HintMessage, TimelineEntry};

/// Derived lock state for one exercise index.
///
/// Completed is an overlay on Unlocked: a completed exercise is always
/// reachable again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExerciseStatus {
    Locked,
    Unlocked,
    Completed,
}

/// Durable learner progress for one module, keyed by exercise index.
///
/// The serialized form is a stable contract shared with every other client
/// of the same storage: camelCase section names, map keys as stringified
/// indices, `completedExercises` as a plain array. Missing sections
/// deserialize as empty, so older partial blobs still load.
///
/// Completion is monotonic. Nothing here ever removes an index from the
/// completed set except [`clear`](Self::clear), which wipes the whole
/// record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    completed_exercises: BTreeSet<usize>,
    exercise_responses: BTreeMap<usize, String>,
    exercise_hints: BTreeMap<usize, usize>,
    exercise_hint_messages: BTreeMap<usize, Vec<HintMessage>>,
    exercise_feedback_messages: BTreeMap<usize, Vec<FeedbackMessage>>,
    exercise_assessments: BTreeMap<usize, Assessment>,
}

impl ProgressRecord {
    /// Creates an empty record, the state of a module never worked on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no section holds any data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed_exercises.is_empty()
            && self.exercise_responses.is_empty()
            && self.exercise_hints.is_empty()
            && self.exercise_hint_messages.is_empty()
            && self.exercise_feedback_messages.is_empty()
            && self.exercise_assessments.is_empty()
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Adds `index` to the completed set. Idempotent.
    pub fn mark_completed(&mut self, index: usize) {
        self.completed_exercises.insert(index);
    }

    /// Overwrites the stored answer text for `index`.
    pub fn set_response(&mut self, index: usize, text: impl Into<String>) {
        self.exercise_responses.insert(index, text.into());
    }

    /// Overwrites the revealed-hint count for `index`.
    pub fn set_hints_used(&mut self, index: usize, count: usize) {
        self.exercise_hints.insert(index, count);
    }

    /// Appends a hint-reveal event for `index`. Hint history only grows.
    pub fn push_hint_message(&mut self, index: usize, message: HintMessage) {
        self.exercise_hint_messages.entry(index).or_default().push(message);
    }

    /// Replaces the feedback slot for `index` with `message`.
    ///
    /// The slot holds at most one entry; each submission's feedback stands
    /// in for whatever was there before.
    pub fn set_feedback_message(&mut self, index: usize, message: FeedbackMessage) {
        self.exercise_feedback_messages.insert(index, vec![message]);
    }

    /// Overwrites the latest assessment tag for `index`.
    pub fn set_assessment(&mut self, index: usize, assessment: Assessment) {
        self.exercise_assessments.insert(index, assessment);
    }

    /// Full reset. The only operation that shrinks the completed set.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ─── Queries ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn is_completed(&self, index: usize) -> bool {
        self.completed_exercises.contains(&index)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_exercises.len()
    }

    #[must_use]
    pub fn completed_exercises(&self) -> &BTreeSet<usize> {
        &self.completed_exercises
    }

    #[must_use]
    pub fn response(&self, index: usize) -> Option<&str> {
        self.exercise_responses.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn responses(&self) -> &BTreeMap<usize, String> {
        &self.exercise_responses
    }

    /// Hints revealed so far for `index`. Defaults to zero.
    #[must_use]
    pub fn hints_used(&self, index: usize) -> usize {
        self.exercise_hints.get(&index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn hint_messages(&self, index: usize) -> &[HintMessage] {
        self.exercise_hint_messages
            .get(&index)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn feedback_messages(&self, index: usize) -> &[FeedbackMessage] {
        self.exercise_feedback_messages
            .get(&index)
            .map_or(&[], Vec::as_slice)
    }

    /// The latest feedback for `index`, if any submission was evaluated.
    #[must_use]
    pub fn feedback_message(&self, index: usize) -> Option<&FeedbackMessage> {
        self.feedback_messages(index).last()
    }

    #[must_use]
    pub fn has_feedback(&self, index: usize) -> bool {
        !self.feedback_messages(index).is_empty()
    }

    #[must_use]
    pub fn assessment(&self, index: usize) -> Option<Assessment> {
        self.exercise_assessments.get(&index).copied()
    }

    /// Merges hint and feedback messages for `index` into one conversation,
    /// sorted by timestamp ascending. Ties keep hints ahead of feedback.
    #[must_use]
    pub fn timeline(&self, index: usize) -> Vec<TimelineEntry> {
        let mut entries: Vec<TimelineEntry> = self
            .hint_messages(index)
            .iter()
            .cloned()
            .map(TimelineEntry::Hint)
            .chain(
                self.feedback_messages(index)
                    .iter()
                    .cloned()
                    .map(TimelineEntry::Feedback),
            )
            .collect();
        entries.sort_by_key(TimelineEntry::timestamp);
        entries
    }

    /// Whether a learner may move to `index` while standing at
    /// `current_index`.
    ///
    /// Unlocking is strictly sequential: an index opens up when it is at or
    /// behind the cursor, already completed, or directly preceded by a
    /// completed exercise. Completing an exercise out of order therefore
    /// unlocks only its immediate successor, never anything further ahead.
    #[must_use]
    pub fn is_unlocked(&self, current_index: usize, index: usize) -> bool {
        index <= current_index
            || self.is_completed(index)
            || (index > 0 && self.is_completed(index - 1))
    }

    /// Derived lock state for `index` relative to `current_index`.
    #[must_use]
    pub fn exercise_status(&self, current_index: usize, index: usize) -> ExerciseStatus {
        if self.is_completed(index) {
            ExerciseStatus::Completed
        } else if self.is_unlocked(current_index, index) {
            ExerciseStatus::Unlocked
        } else {
            ExerciseStatus::Locked
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
