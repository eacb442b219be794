#![forbid(unsafe_code)]

pub mod debounce;
pub mod error;
pub mod progress;

pub use coach_core::Clock;

pub use debounce::{DebouncedValue, Debouncer};
pub use error::ProgressError;

pub use progress::{
    AdvanceOutcome, ExerciseTab, ExerciseUiState, ModuleSession, ProgressStore, SAVE_DEBOUNCE,
    SessionProgress,
};
