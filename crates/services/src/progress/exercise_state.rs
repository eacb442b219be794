use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use coach_core::model::{FeedbackMessage, HintMessage, MessageId, ProgressRecord, TimelineEntry};

/// How long the completion celebration stays up before clearing itself.
const CELEBRATION_MS: i64 = 3_000;

/// How long a newly reachable exercise keeps its "just unlocked" highlight.
const JUST_UNLOCKED_MS: i64 = 4_000;

/// Which pane of the exercise panel is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExerciseTab {
    #[default]
    Prompt,
    Material,
}

/// Transient state for one visit to one exercise. Never persisted.
///
/// The durable record is the source of truth; [`reset`](Self::reset)
/// reconstructs this state from it on every navigation, so nothing here can
/// leak from one exercise visit into the next. The transient flags carry
/// expiry deadlines instead of running timers; callers ask with a `now` and
/// expired flags simply read as off.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseUiState {
    attempt_number: u32,
    hints_used: usize,
    timeline: Vec<TimelineEntry>,
    active_tab: ExerciseTab,
    collapsed_hints: HashSet<MessageId>,
    celebrating_until: Option<DateTime<Utc>>,
    just_unlocked_until: Option<DateTime<Utc>>,
    show_continue: bool,
    show_completion_modal: bool,
}

impl ExerciseUiState {
    /// A pristine visit: first attempt, prompt tab, empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempt_number: 1,
            hints_used: 0,
            timeline: Vec::new(),
            active_tab: ExerciseTab::Prompt,
            collapsed_hints: HashSet::new(),
            celebrating_until: None,
            just_unlocked_until: None,
            show_continue: false,
            show_completion_modal: false,
        }
    }

    /// Rebuilds the visit state for `index` from the durable record.
    ///
    /// Seeds the hint counter and the merged conversation timeline from what
    /// is saved, shows the continue affordance when the exercise already has
    /// feedback, and returns everything else to its pristine state.
    pub fn reset(&mut self, record: &ProgressRecord, index: usize) {
        *self = Self {
            hints_used: record.hints_used(index),
            timeline: record.timeline(index),
            show_continue: record.has_feedback(index),
            ..Self::new()
        };
    }

    // ─── Queries ───────────────────────────────────────────────────────────────

    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    #[must_use]
    pub fn hints_used(&self) -> usize {
        self.hints_used
    }

    #[must_use]
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    #[must_use]
    pub fn active_tab(&self) -> ExerciseTab {
        self.active_tab
    }

    #[must_use]
    pub fn show_continue(&self) -> bool {
        self.show_continue
    }

    #[must_use]
    pub fn completion_modal_open(&self) -> bool {
        self.show_completion_modal
    }

    #[must_use]
    pub fn is_hint_collapsed(&self, id: MessageId) -> bool {
        self.collapsed_hints.contains(&id)
    }

    #[must_use]
    pub fn is_celebrating(&self, now: DateTime<Utc>) -> bool {
        self.celebrating_until.is_some_and(|until| now < until)
    }

    #[must_use]
    pub fn is_just_unlocked(&self, now: DateTime<Utc>) -> bool {
        self.just_unlocked_until.is_some_and(|until| now < until)
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    pub fn set_active_tab(&mut self, tab: ExerciseTab) {
        self.active_tab = tab;
    }

    pub fn toggle_hint_collapsed(&mut self, id: MessageId) {
        if !self.collapsed_hints.remove(&id) {
            self.collapsed_hints.insert(id);
        }
    }

    pub fn dismiss_completion_modal(&mut self) {
        self.show_completion_modal = false;
    }

    /// A submission came back without clearing the exercise; the next one
    /// counts as a later attempt.
    pub(crate) fn record_failed_attempt(&mut self) {
        self.attempt_number += 1;
    }

    /// Appends a freshly revealed hint to the live conversation.
    pub(crate) fn push_hint(&mut self, message: HintMessage) {
        self.hints_used += 1;
        self.timeline.push(TimelineEntry::Hint(message));
    }

    /// Replaces the feedback shown in the live conversation. Any earlier
    /// feedback entry disappears, mirroring the durable replace semantics.
    pub(crate) fn replace_feedback(&mut self, message: FeedbackMessage) {
        self.timeline
            .retain(|entry| !matches!(entry, TimelineEntry::Feedback(_)));
        self.timeline.push(TimelineEntry::Feedback(message));
        self.show_continue = true;
    }

    /// Arms the self-clearing celebration flags, measured from `now`.
    pub(crate) fn begin_unlock_celebration(&mut self, now: DateTime<Utc>) {
        self.celebrating_until = Some(now + Duration::milliseconds(CELEBRATION_MS));
        self.just_unlocked_until = Some(now + Duration::milliseconds(JUST_UNLOCKED_MS));
    }

    pub(crate) fn open_completion_modal(&mut self) {
        self.show_completion_modal = true;
    }
}

impl Default for ExerciseUiState {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
