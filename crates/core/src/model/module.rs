use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ModuleId;

/// Upper bound on static hints an exercise may carry.
pub const MAX_HINTS: usize = 3;

/// Validation errors raised while building modules and exercises.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("module must contain at least one exercise")]
    NoExercises,

    #[error("exercise title cannot be empty")]
    EmptyExerciseTitle,

    #[error("exercise prompt cannot be empty")]
    EmptyPrompt,

    #[error("exercise carries {count} hints, at most {MAX_HINTS} are allowed")]
    TooManyHints { count: usize },
}

/// What shape of thinking an exercise asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Analysis,
    Comparative,
    Framework,
}

/// Difficulty band a module is pitched at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// One unit of work inside a module, identified by its position.
///
/// Exercises are immutable once fetched; all mutable learner state lives in
/// the progress record, keyed by this exercise's index.
#[derive(Clone, Debug, PartialEq)]
pub struct Exercise {
    title: String,
    kind: ExerciseKind,
    prompt: String,
    material: Option<String>,
    hints: Vec<String>,
    model_answer: Option<String>,
}

impl Exercise {
    /// Builds a validated exercise.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyExerciseTitle` or `ModuleError::EmptyPrompt`
    /// when the respective text is blank, and `ModuleError::TooManyHints` when
    /// more than [`MAX_HINTS`] hints are supplied.
    pub fn new(
        title: impl Into<String>,
        kind: ExerciseKind,
        prompt: impl Into<String>,
        hints: Vec<String>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyExerciseTitle);
        }

        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ModuleError::EmptyPrompt);
        }

        if hints.len() > MAX_HINTS {
            return Err(ModuleError::TooManyHints { count: hints.len() });
        }

        Ok(Self {
            title,
            kind,
            prompt,
            material: None,
            hints,
            model_answer: None,
        })
    }

    /// Attaches source material shown alongside the prompt.
    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Attaches the authored reference answer for this exercise.
    ///
    /// Revealing it is the evaluator's call; the submission outcome carries
    /// the copy actually shown to the learner.
    #[must_use]
    pub fn with_model_answer(mut self, model_answer: impl Into<String>) -> Self {
        self.model_answer = Some(model_answer.into());
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    #[must_use]
    pub fn model_answer(&self) -> Option<&str> {
        self.model_answer.as_deref()
    }

    #[must_use]
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    #[must_use]
    pub fn hint_count(&self) -> usize {
        self.hints.len()
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered set of exercises a learner works through front to back.
///
/// Content is read-only after construction; exercise identity is positional,
/// which is what the progress record keys by.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    id: ModuleId,
    title: String,
    skill_level: SkillLevel,
    exercises: Vec<Exercise>,
}

impl Module {
    /// Builds a validated module.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` when the title is blank and
    /// `ModuleError::NoExercises` when the exercise list is empty.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        skill_level: SkillLevel,
        exercises: Vec<Exercise>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }

        if exercises.is_empty() {
            return Err(ModuleError::NoExercises);
        }

        Ok(Self {
            id,
            title,
            skill_level,
            exercises,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn skill_level(&self) -> SkillLevel {
        self.skill_level
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    #[must_use]
    pub fn exercise(&self, index: usize) -> Option<&Exercise> {
        self.exercises.get(index)
    }

    /// Total number of exercises in this module.
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    /// Index of the last exercise.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.exercises.len() - 1
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn build_exercise(title: &str) -> Exercise {
        Exercise::new(
            title,
            ExerciseKind::Analysis,
            "Explain the core trade-off",
            vec!["Think about cost".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_exercise_rejects_blank_title_and_prompt() {
        let err = Exercise::new("  ", ExerciseKind::Analysis, "p", vec![]).unwrap_err();
        assert_eq!(err, ModuleError::EmptyExerciseTitle);

        let err = Exercise::new("t", ExerciseKind::Framework, "\t", vec![]).unwrap_err();
        assert_eq!(err, ModuleError::EmptyPrompt);
    }

    #[test]
    fn test_exercise_rejects_too_many_hints() {
        let hints = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let err = Exercise::new("t", ExerciseKind::Comparative, "p", hints).unwrap_err();
        assert_eq!(err, ModuleError::TooManyHints { count: 4 });
    }

    #[test]
    fn test_exercise_carries_optional_material() {
        let exercise = build_exercise("Reading").with_material("Source text");
        assert_eq!(exercise.material(), Some("Source text"));
        assert_eq!(exercise.hint_count(), 1);
    }

    #[test]
    fn test_exercise_carries_optional_model_answer() {
        let plain = build_exercise("Plain");
        assert_eq!(plain.model_answer(), None);

        let exercise = build_exercise("Guided").with_model_answer("A worked answer");
        assert_eq!(exercise.model_answer(), Some("A worked answer"));
    }

    #[test]
    fn test_module_requires_title_and_exercises() {
        let id = ModuleId::random();
        let err = Module::new(id, "", SkillLevel::Beginner, vec![build_exercise("E1")]).unwrap_err();
        assert_eq!(err, ModuleError::EmptyTitle);

        let err = Module::new(id, "Logic", SkillLevel::Beginner, vec![]).unwrap_err();
        assert_eq!(err, ModuleError::NoExercises);
    }

    #[test]
    fn test_module_indexes_exercises_positionally() {
        let module = Module::new(
            ModuleId::random(),
            "Logic",
            SkillLevel::Intermediate,
            vec![build_exercise("E1"), build_exercise("E2")],
        )
        .unwrap();

        assert_eq!(module.exercise_count(), 2);
        assert_eq!(module.last_index(), 1);
        assert_eq!(module.exercise(1).unwrap().title(), "E2");
        assert!(module.exercise(2).is_none());
    }

    #[test]
    fn test_kind_and_level_wire_tags() {
        let json = serde_json::to_string(&ExerciseKind::Comparative).unwrap();
        assert_eq!(json, "\"comparative\"");
        let json = serde_json::to_string(&SkillLevel::Advanced).unwrap();
        assert_eq!(json, "\"advanced\"");
    }
}
