mod exercise_state;
mod session;
mod store;

// Public API of the progress subsystem.
pub use crate::error::ProgressError;
pub use exercise_state::{ExerciseTab, ExerciseUiState};
pub use session::{AdvanceOutcome, ModuleSession, SessionProgress};
pub use store::{ProgressStore, SAVE_DEBOUNCE};
