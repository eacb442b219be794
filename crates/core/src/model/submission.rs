use serde::Deserialize;

use crate::model::assessment::Assessment;

/// Evaluation result for one submitted answer, as delivered by the backend
/// collaborator.
///
/// Field names mirror the backend contract (snake_case on the wire). The
/// session controller only branches on `should_advance`; everything else is
/// carried through into the feedback message shown to the learner.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubmissionOutcome {
    pub assessment: Assessment,
    pub feedback: String,
    pub should_advance: bool,
    #[serde(default)]
    pub show_model_answer: bool,
    #[serde(default)]
    pub model_answer: Option<String>,
}

impl SubmissionOutcome {
    /// Creates an outcome with no model answer attached.
    #[must_use]
    pub fn new(assessment: Assessment, feedback: impl Into<String>, should_advance: bool) -> Self {
        Self {
            assessment,
            feedback: feedback.into(),
            should_advance,
            show_model_answer: false,
            model_answer: None,
        }
    }

    /// Attaches a model answer and marks it for display.
    #[must_use]
    pub fn with_model_answer(mut self, model_answer: impl Into<String>) -> Self {
        self.show_model_answer = true;
        self.model_answer = Some(model_answer.into());
        self
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_parses_the_backend_contract() {
        let json = r#"{
            "assessment": "strong",
            "feedback": "Well argued",
            "should_advance": true,
            "show_model_answer": true,
            "model_answer": "A reference answer"
        }"#;
        let outcome: SubmissionOutcome = serde_json::from_str(json).unwrap();

        assert_eq!(outcome.assessment, Assessment::Strong);
        assert!(outcome.should_advance);
        assert_eq!(outcome.model_answer.as_deref(), Some("A reference answer"));
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        let json = r#"{
            "assessment": "developing",
            "feedback": "Expand your second point",
            "should_advance": false
        }"#;
        let outcome: SubmissionOutcome = serde_json::from_str(json).unwrap();

        assert!(!outcome.show_model_answer);
        assert!(outcome.model_answer.is_none());
    }

    #[test]
    fn test_builder_marks_model_answer_visible() {
        let outcome = SubmissionOutcome::new(Assessment::Strong, "Done", true)
            .with_model_answer("Reference");
        assert!(outcome.show_model_answer);
        assert_eq!(outcome.model_answer.as_deref(), Some("Reference"));
    }
}
