use std::fmt;

use coach_core::Clock;
use coach_core::model::{
    Exercise, ExerciseStatus, FeedbackMessage, HintMessage, MessageId, Module, ProgressRecord,
    SubmissionOutcome,
};

use super::exercise_state::{ExerciseTab, ExerciseUiState};
use super::store::ProgressStore;
use crate::error::ProgressError;

//
// ─── PROGRESS SUMMARY ──────────────────────────────────────────────────────────
//

/// Aggregated module progress, sized for header chrome and progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// What an [`advance`](ModuleSession::advance) call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved the cursor onto the next exercise.
    Advanced { to: usize },
    /// The final exercise was just completed; the module-complete signal
    /// fired with this outcome.
    ModuleCompleted,
    /// The module had already signaled completion; nothing fired again.
    AlreadyComplete,
}

//
// ─── MODULE SESSION ────────────────────────────────────────────────────────────
//

/// Walks a learner through one module: unlock gating, navigation,
/// submissions, and hint reveals.
///
/// Owns the progress store and the per-visit transient state. Every
/// transition onto an exercise rebuilds the transient state from the
/// durable record, so each visit starts from what is actually saved.
///
/// The cursor (`current_index`) is presentation state owned by the
/// surrounding page, handed in at start and never persisted here.
pub struct ModuleSession {
    module: Module,
    store: ProgressStore,
    current_index: usize,
    ui: ExerciseUiState,
    clock: Clock,
    submission_in_flight: bool,
    completion_signaled: bool,
}

impl ModuleSession {
    /// Loads durable progress and positions the cursor at `initial_index`,
    /// clamped into the module's range.
    pub async fn start(
        module: Module,
        mut store: ProgressStore,
        initial_index: usize,
        clock: Clock,
    ) -> Self {
        let record = store.load().await;
        let current_index = initial_index.min(module.last_index());
        let mut ui = ExerciseUiState::new();
        ui.reset(&record, current_index);

        Self {
            module,
            store,
            current_index,
            ui,
            clock,
            submission_in_flight: false,
            completion_signaled: false,
        }
    }

    // ─── Queries ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.module.exercise(self.current_index)
    }

    /// Transient state for the exercise currently being visited.
    #[must_use]
    pub fn ui(&self) -> &ExerciseUiState {
        &self.ui
    }

    /// Whether the learner may move onto `index` right now.
    ///
    /// An index is reachable when it sits at or behind the cursor, is
    /// already completed, or follows a completed exercise. Completing an
    /// exercise out of order therefore opens only its direct successor.
    #[must_use]
    pub fn is_exercise_unlocked(&self, index: usize) -> bool {
        index < self.module.exercise_count()
            && self.store.is_unlocked(self.current_index, index)
    }

    /// Derived lock state for `index`, with Completed overlaying Unlocked.
    #[must_use]
    pub fn exercise_status(&self, index: usize) -> ExerciseStatus {
        self.store.exercise_status(self.current_index, index)
    }

    #[must_use]
    pub fn is_module_complete(&self) -> bool {
        self.store.completed_count() >= self.module.exercise_count()
    }

    /// Returns a summary of the current module progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.module.exercise_count();
        let completed = self.store.completed_count().min(total);
        SessionProgress {
            total,
            completed,
            remaining: total - completed,
            is_complete: completed >= total,
        }
    }

    /// A point-in-time copy of the durable record.
    #[must_use]
    pub fn snapshot(&self) -> ProgressRecord {
        self.store.snapshot()
    }

    #[must_use]
    pub fn has_pending_write(&self) -> bool {
        self.store.has_pending_write()
    }

    #[must_use]
    pub fn is_celebrating(&self) -> bool {
        self.ui.is_celebrating(self.clock.now())
    }

    #[must_use]
    pub fn is_just_unlocked(&self) -> bool {
        self.ui.is_just_unlocked(self.clock.now())
    }

    // ─── Navigation ────────────────────────────────────────────────────────────

    /// Moves the cursor onto `index` and rebuilds the visit state.
    ///
    /// Locked or out-of-range targets are ignored; stale buttons may
    /// legitimately fire this after state already moved on.
    pub fn navigate_to(&mut self, index: usize) {
        if !self.is_exercise_unlocked(index) {
            return;
        }
        self.current_index = index;
        self.reset_for_current();
    }

    /// Completes the current exercise and moves forward.
    ///
    /// On the last exercise the cursor stays put and the module-complete
    /// signal fires instead, exactly once per session.
    pub fn advance(&mut self) -> AdvanceOutcome {
        self.store.complete_exercise(self.current_index);

        let next = self.current_index + 1;
        if next < self.module.exercise_count() {
            self.current_index = next;
            self.reset_for_current();
            self.ui.begin_unlock_celebration(self.clock.now());
            AdvanceOutcome::Advanced { to: next }
        } else if self.completion_signaled {
            AdvanceOutcome::AlreadyComplete
        } else {
            self.completion_signaled = true;
            self.ui.open_completion_modal();
            AdvanceOutcome::ModuleCompleted
        }
    }

    fn reset_for_current(&mut self) {
        let record = self.store.snapshot();
        self.ui.reset(&record, self.current_index);
    }

    // ─── Submissions ───────────────────────────────────────────────────────────

    /// Claims the submit path. Returns false while an earlier submission is
    /// still being evaluated; the caller must drop the duplicate.
    pub fn begin_submission(&mut self) -> bool {
        if self.submission_in_flight {
            return false;
        }
        self.submission_in_flight = true;
        true
    }

    /// Releases the submit path without an outcome (evaluation failed or
    /// was abandoned).
    pub fn abort_submission(&mut self) {
        self.submission_in_flight = false;
    }

    #[must_use]
    pub fn submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    /// Records an evaluated submission and reacts to its verdict.
    ///
    /// The answer, assessment, and feedback land in the progress store
    /// (feedback replacing any earlier one). A verdict that clears the
    /// exercise triggers [`advance`](Self::advance) and returns its
    /// outcome; otherwise the attempt counter moves up and the cursor stays.
    pub fn handle_submission(
        &mut self,
        answer: &str,
        outcome: &SubmissionOutcome,
    ) -> Option<AdvanceOutcome> {
        self.submission_in_flight = false;

        let index = self.current_index;
        let now = self.clock.now();

        self.store.save_response(index, answer);
        self.store.save_assessment(index, outcome.assessment);

        let mut feedback = FeedbackMessage::new(
            outcome.feedback.clone(),
            outcome.assessment,
            self.ui.attempt_number(),
            now,
        );
        if outcome.show_model_answer {
            if let Some(model_answer) = &outcome.model_answer {
                feedback = feedback.with_model_answer(model_answer.clone());
            }
        }
        self.store.replace_feedback_message(index, feedback.clone());
        self.ui.replace_feedback(feedback);

        if outcome.should_advance {
            Some(self.advance())
        } else {
            self.ui.record_failed_attempt();
            None
        }
    }

    // ─── Hints ─────────────────────────────────────────────────────────────────

    /// Reveals the next static hint for the current exercise and returns
    /// its text, or `None` when every hint is already out.
    ///
    /// The revealed count and the hint event both land in the progress
    /// store; the count can never pass the exercise's static hint supply.
    pub fn request_hint(&mut self) -> Option<String> {
        let index = self.current_index;
        let exercise = self.module.exercise(index)?;

        let used = self.store.hints_used(index);
        let hint = exercise.hints().get(used)?.clone();

        let message = HintMessage::new(hint.clone(), self.clock.now());
        self.store.save_hints(index, used + 1);
        self.store.append_hint_message(index, message.clone());
        self.ui.push_hint(message);

        Some(hint)
    }

    // ─── Transient passthroughs ────────────────────────────────────────────────

    pub fn set_active_tab(&mut self, tab: ExerciseTab) {
        self.ui.set_active_tab(tab);
    }

    pub fn toggle_hint_collapsed(&mut self, id: MessageId) {
        self.ui.toggle_hint_collapsed(id);
    }

    pub fn dismiss_completion_modal(&mut self) {
        self.ui.dismiss_completion_modal();
    }

    // ─── Persistence ───────────────────────────────────────────────────────────

    /// Persists the current record immediately, canceling the debounce.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when encoding fails or storage rejects the
    /// write.
    pub async fn flush(&mut self) -> Result<(), ProgressError> {
        self.store.flush().await
    }

    /// Wipes all progress for this module, durable blob included, and
    /// returns the session to a fresh start on the first exercise.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when storage rejects the removal.
    pub async fn clear_progress(&mut self) -> Result<(), ProgressError> {
        self.store.clear().await?;
        self.current_index = 0;
        self.completion_signaled = false;
        self.submission_in_flight = false;
        self.reset_for_current();
        Ok(())
    }
}

impl fmt::Debug for ModuleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSession")
            .field("module_id", &self.module.id())
            .field("current_index", &self.current_index)
            .field("completed", &self.store.completed_count())
            .field("submission_in_flight", &self.submission_in_flight)
            .field("completion_signaled", &self.completion_signaled)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use coach_core::model::{Assessment, ExerciseKind, ModuleId, SkillLevel};
    use coach_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::repository::{InMemoryStorage, ProgressStorage};

    fn build_module(exercise_count: usize) -> Module {
        let exercises = (0..exercise_count)
            .map(|i| {
                Exercise::new(
                    format!("Exercise {i}"),
                    ExerciseKind::Analysis,
                    format!("Prompt {i}"),
                    vec![
                        format!("hint {i}.1"),
                        format!("hint {i}.2"),
                        format!("hint {i}.3"),
                    ],
                )
                .unwrap()
            })
            .collect();
        Module::new(ModuleId::random(), "Test Module", SkillLevel::Beginner, exercises).unwrap()
    }

    async fn start_session(exercise_count: usize) -> (ModuleSession, InMemoryStorage) {
        let storage = InMemoryStorage::new();
        let module = build_module(exercise_count);
        let store = ProgressStore::new(&module.id(), Arc::new(storage.clone()));
        let session = ModuleSession::start(module, store, 0, fixed_clock()).await;
        (session, storage)
    }

    fn strong_outcome(feedback: &str) -> SubmissionOutcome {
        SubmissionOutcome::new(Assessment::Strong, feedback, true)
    }

    fn weak_outcome(feedback: &str) -> SubmissionOutcome {
        SubmissionOutcome::new(Assessment::Developing, feedback, false)
    }

    #[tokio::test]
    async fn session_starts_on_the_first_exercise() {
        let (session, _) = start_session(3).await;

        assert_eq!(session.current_index(), 0);
        assert_eq!(session.current_exercise().unwrap().title(), "Exercise 0");
        assert!(session.is_exercise_unlocked(0));
        assert!(!session.is_exercise_unlocked(1));
        assert_eq!(session.exercise_status(2), ExerciseStatus::Locked);
        assert_eq!(session.progress().total, 3);
        assert_eq!(session.progress().completed, 0);
    }

    #[tokio::test]
    async fn start_clamps_an_out_of_range_cursor() {
        let storage = InMemoryStorage::new();
        let module = build_module(3);
        let store = ProgressStore::new(&module.id(), Arc::new(storage.clone()));
        let session = ModuleSession::start(module, store, 99, fixed_clock()).await;

        assert_eq!(session.current_index(), 2);
    }

    #[tokio::test]
    async fn unlock_opens_only_the_direct_successor() {
        let (mut session, _) = start_session(4).await;

        // completing 0 moves the cursor to 1 and opens nothing past it
        session.advance();
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_exercise_unlocked(2));
        assert!(!session.is_exercise_unlocked(3));

        session.advance();
        assert!(session.is_exercise_unlocked(2));
        assert!(!session.is_exercise_unlocked(3));
    }

    #[tokio::test]
    async fn navigate_ignores_locked_and_out_of_range_targets() {
        let (mut session, _) = start_session(3).await;

        session.navigate_to(2);
        assert_eq!(session.current_index(), 0);
        session.navigate_to(7);
        assert_eq!(session.current_index(), 0);

        session.advance();
        session.navigate_to(0);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.exercise_status(0), ExerciseStatus::Completed);
    }

    #[tokio::test]
    async fn advance_on_the_last_exercise_signals_exactly_once() {
        let (mut session, _) = start_session(3).await;

        assert_eq!(session.advance(), AdvanceOutcome::Advanced { to: 1 });
        assert_eq!(session.advance(), AdvanceOutcome::Advanced { to: 2 });

        let outcome = session.advance();
        assert_eq!(outcome, AdvanceOutcome::ModuleCompleted);
        assert_eq!(session.current_index(), 2);
        assert!(session.snapshot().is_completed(2));
        assert!(session.is_module_complete());
        assert!(session.ui().completion_modal_open());

        // a second advance on the finished module stays quiet
        assert_eq!(session.advance(), AdvanceOutcome::AlreadyComplete);

        session.dismiss_completion_modal();
        assert!(!session.ui().completion_modal_open());
    }

    #[tokio::test]
    async fn advancing_arms_the_celebration_flags() {
        let (mut session, _) = start_session(2).await;
        assert!(!session.is_celebrating());

        session.advance();
        assert!(session.is_celebrating());
        assert!(session.is_just_unlocked());
    }

    #[tokio::test]
    async fn strong_submission_records_and_advances() {
        let (mut session, _) = start_session(3).await;

        assert!(session.begin_submission());
        let outcome = session.handle_submission("my full answer", &strong_outcome("Well argued"));
        assert_eq!(outcome, Some(AdvanceOutcome::Advanced { to: 1 }));
        assert!(!session.submission_in_flight());

        let record = session.snapshot();
        assert!(record.is_completed(0));
        assert_eq!(record.response(0), Some("my full answer"));
        assert_eq!(record.assessment(0), Some(Assessment::Strong));
        assert_eq!(record.feedback_message(0).unwrap().content, "Well argued");
    }

    #[tokio::test]
    async fn weak_submission_stays_put_and_counts_the_attempt() {
        let (mut session, _) = start_session(3).await;

        let outcome = session.handle_submission("first try", &weak_outcome("Expand your point"));
        assert_eq!(outcome, None);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.ui().attempt_number(), 2);
        assert!(session.ui().show_continue());
        assert!(!session.snapshot().is_completed(0));

        // the retry replaces both the stored response and the feedback
        session.handle_submission("second try", &weak_outcome("Closer now"));
        assert_eq!(session.ui().attempt_number(), 3);

        let record = session.snapshot();
        assert_eq!(record.response(0), Some("second try"));
        assert_eq!(record.feedback_messages(0).len(), 1);
        let feedback = record.feedback_message(0).unwrap();
        assert_eq!(feedback.content, "Closer now");
        assert_eq!(feedback.attempt_number, 2);
    }

    #[tokio::test]
    async fn model_answer_rides_along_when_marked_visible() {
        let (mut session, _) = start_session(1).await;

        let outcome = weak_outcome("See the reference").with_model_answer("Reference answer");
        session.handle_submission("attempt", &outcome);

        let record = session.snapshot();
        assert_eq!(
            record.feedback_message(0).unwrap().model_answer.as_deref(),
            Some("Reference answer")
        );
    }

    #[tokio::test]
    async fn duplicate_submissions_are_rejected_while_one_is_in_flight() {
        let (mut session, _) = start_session(2).await;

        assert!(session.begin_submission());
        assert!(!session.begin_submission());

        session.abort_submission();
        assert!(session.begin_submission());

        session.handle_submission("answer", &weak_outcome("Hm"));
        assert!(session.begin_submission());
    }

    #[tokio::test]
    async fn transient_passthroughs_reach_the_visit_state() {
        let (mut session, _) = start_session(2).await;

        session.set_active_tab(ExerciseTab::Material);
        assert_eq!(session.ui().active_tab(), ExerciseTab::Material);

        session.request_hint();
        let id = session.ui().timeline()[0].id();
        session.toggle_hint_collapsed(id);
        assert!(session.ui().is_hint_collapsed(id));
        session.toggle_hint_collapsed(id);
        assert!(!session.ui().is_hint_collapsed(id));
    }

    #[tokio::test]
    async fn hints_reveal_in_order_and_run_out() {
        let (mut session, _) = start_session(2).await;

        assert_eq!(session.request_hint().as_deref(), Some("hint 0.1"));
        assert_eq!(session.request_hint().as_deref(), Some("hint 0.2"));
        assert_eq!(session.request_hint().as_deref(), Some("hint 0.3"));
        assert_eq!(session.request_hint(), None);

        let record = session.snapshot();
        assert_eq!(record.hints_used(0), 3);
        assert_eq!(record.hint_messages(0).len(), 3);
        assert_eq!(session.ui().hints_used(), 3);
        assert_eq!(session.ui().timeline().len(), 3);
    }

    #[tokio::test]
    async fn revisiting_an_exercise_reseeds_the_visit_from_the_record() {
        let (mut session, _) = start_session(3).await;

        session.request_hint();
        session.handle_submission("try", &weak_outcome("Not yet"));
        assert_eq!(session.ui().attempt_number(), 2);

        session.handle_submission("better", &strong_outcome("There it is"));
        assert_eq!(session.current_index(), 1);
        // the new visit starts clean
        assert_eq!(session.ui().attempt_number(), 1);
        assert!(session.ui().timeline().is_empty());
        assert!(!session.ui().show_continue());

        session.navigate_to(0);
        assert_eq!(session.ui().attempt_number(), 1);
        assert_eq!(session.ui().hints_used(), 1);
        // hint plus latest feedback, merged oldest-first
        let timeline = session.ui().timeline();
        assert_eq!(timeline.len(), 2);
        assert!(timeline[0].is_hint());
        assert_eq!(timeline[1].content(), "There it is");
        assert!(session.ui().show_continue());
    }

    #[tokio::test]
    async fn restart_restores_progress_from_storage() {
        let storage = InMemoryStorage::new();
        let module = build_module(3);
        let module_id = module.id();

        let store = ProgressStore::new(&module_id, Arc::new(storage.clone()));
        let mut session = ModuleSession::start(module.clone(), store, 0, fixed_clock()).await;
        session.request_hint();
        session.handle_submission("solid", &strong_outcome("Good"));
        session.flush().await.unwrap();
        drop(session);

        let store = ProgressStore::new(&module_id, Arc::new(storage.clone()));
        let session = ModuleSession::start(module, store, 1, fixed_clock()).await;

        assert_eq!(session.current_index(), 1);
        assert!(session.snapshot().is_completed(0));
        assert_eq!(session.exercise_status(0), ExerciseStatus::Completed);
        assert!(session.is_exercise_unlocked(1));
        assert!(!session.is_exercise_unlocked(2));
    }

    #[tokio::test]
    async fn clear_progress_returns_the_session_to_a_fresh_start() {
        let (mut session, storage) = start_session(3).await;

        session.handle_submission("done", &strong_outcome("Clear"));
        session.flush().await.unwrap();
        let key = session.store.key().to_string();

        session.clear_progress().await.unwrap();
        assert_eq!(session.current_index(), 0);
        assert!(session.snapshot().is_empty());
        assert_eq!(session.ui().attempt_number(), 1);
        assert!(!session.is_module_complete());
        assert_eq!(storage.get(&key).await.unwrap(), None);
    }
}
