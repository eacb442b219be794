mod assessment;
mod ids;
mod message;
mod module;
mod progress;
mod submission;

pub use assessment::Assessment;
pub use ids::{MessageId, ModuleId, ParseIdError};

pub use message::{FeedbackMessage, HintMessage, TimelineEntry};
pub use module::{Exercise, ExerciseKind, MAX_HINTS, Module, ModuleError, SkillLevel};
pub use progress::{ExerciseStatus, ProgressRecord};
pub use submission::SubmissionOutcome;
