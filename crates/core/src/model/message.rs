use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::assessment::Assessment;
use crate::model::ids::MessageId;

/// Wire tag carried by every persisted hint message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
enum HintTag {
    #[default]
    #[serde(rename = "hint")]
    Hint,
}

/// Wire tag carried by every persisted feedback message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
enum FeedbackTag {
    #[default]
    #[serde(rename = "feedback")]
    Feedback,
}

//
// ─── HINT ──────────────────────────────────────────────────────────────────────
//

/// One revealed hint, stamped with the moment it was shown.
///
/// Hints accumulate per exercise and are never rewritten; the timestamp
/// orders them inside the merged conversation timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HintMessage {
    pub id: MessageId,
    #[serde(rename = "type", default)]
    tag: HintTag,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HintMessage {
    /// Creates a hint message with a fresh random id.
    #[must_use]
    pub fn new(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::random(),
            tag: HintTag::Hint,
            content: content.into(),
            timestamp,
        }
    }
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Evaluation feedback for one submission attempt.
///
/// At most one feedback message is kept per exercise: recording a new one
/// replaces the old, so re-reading an exercise always shows the latest
/// verdict rather than the whole history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackMessage {
    pub id: MessageId,
    #[serde(rename = "type", default)]
    tag: FeedbackTag,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub assessment: Assessment,
    pub attempt_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,
}

impl FeedbackMessage {
    /// Creates a feedback message with a fresh random id and no model answer.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        assessment: Assessment,
        attempt_number: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::random(),
            tag: FeedbackTag::Feedback,
            content: content.into(),
            timestamp,
            assessment,
            attempt_number,
            model_answer: None,
        }
    }

    /// Attaches the reference answer revealed alongside this feedback.
    #[must_use]
    pub fn with_model_answer(mut self, model_answer: impl Into<String>) -> Self {
        self.model_answer = Some(model_answer.into());
        self
    }
}

//
// ─── TIMELINE ──────────────────────────────────────────────────────────────────
//

/// One row of the merged hint/feedback conversation, ordered by timestamp.
///
/// This is a derived view; only the underlying messages are persisted.
#[derive(Clone, Debug, PartialEq)]
pub enum TimelineEntry {
    Hint(HintMessage),
    Feedback(FeedbackMessage),
}

impl TimelineEntry {
    #[must_use]
    pub fn id(&self) -> MessageId {
        match self {
            TimelineEntry::Hint(message) => message.id,
            TimelineEntry::Feedback(message) => message.id,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Hint(message) => message.timestamp,
            TimelineEntry::Feedback(message) => message.timestamp,
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            TimelineEntry::Hint(message) => &message.content,
            TimelineEntry::Feedback(message) => &message.content,
        }
    }

    #[must_use]
    pub fn is_hint(&self) -> bool {
        matches!(self, TimelineEntry::Hint(_))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn test_hint_serializes_with_type_tag() {
        let hint = HintMessage::new("Start from the definition", fixed_now());
        let value: serde_json::Value = serde_json::to_value(&hint).unwrap();

        assert_eq!(value["type"], "hint");
        assert_eq!(value["content"], "Start from the definition");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_feedback_serializes_camel_case_and_omits_missing_answer() {
        let feedback = FeedbackMessage::new("Solid start", Assessment::Developing, 2, fixed_now());
        let value: serde_json::Value = serde_json::to_value(&feedback).unwrap();

        assert_eq!(value["type"], "feedback");
        assert_eq!(value["assessment"], "developing");
        assert_eq!(value["attemptNumber"], 2);
        assert!(value.get("modelAnswer").is_none());

        let with_answer = FeedbackMessage::new("Done", Assessment::Strong, 3, fixed_now())
            .with_model_answer("A full worked answer");
        let value = serde_json::to_value(&with_answer).unwrap();
        assert_eq!(value["modelAnswer"], "A full worked answer");
    }

    #[test]
    fn test_feedback_roundtrips_through_json() {
        let original = FeedbackMessage::new("Close", Assessment::NeedsSupport, 1, fixed_now());
        let json = serde_json::to_string(&original).unwrap();
        let parsed: FeedbackMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_timeline_entry_exposes_inner_fields() {
        let hint = HintMessage::new("Look again", fixed_now());
        let entry = TimelineEntry::Hint(hint.clone());

        assert!(entry.is_hint());
        assert_eq!(entry.id(), hint.id);
        assert_eq!(entry.content(), "Look again");
        assert_eq!(entry.timestamp(), hint.timestamp);
    }
}
