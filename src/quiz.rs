use crate::content::{Category, ContentRecord};
use crate::error::{Result, StoreError};
use crate::store::ContentStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A multiple-choice question. `answer` holds the literal text of the correct
/// option, not its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptScore {
    pub correct: usize,
    pub total: usize,
}

/// Parses the `questions` array of a quiz record. A quiz without one has no
/// questions.
pub fn questions(record: &ContentRecord) -> std::result::Result<Vec<Question>, serde_json::Error> {
    match record.fields.get("questions") {
        Some(v) => Vec::<Question>::deserialize(v),
        None => Ok(Vec::new()),
    }
}

/// Minimal quiz for device-to-device sharing: labels and questions only.
pub fn share_payload(record: &ContentRecord) -> Value {
    let mut payload = json!({
        "title": record.title,
        "subject": record.subject,
        "grade": record.grade,
    });
    if let Some(q) = record.fields.get("questions") {
        payload["questions"] = q.clone();
    }
    payload
}

/// Adds a quiz received as shared text. Goes through the direct-add path, so
/// receiving the same quiz twice stores it twice.
pub fn import_shared_quiz(store: &ContentStore, text: &str) -> Result<i64> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::Import(format!("invalid quiz data: {e}")))?;
    store.add_json(Category::Quiz, value)
}

/// Scores one offline attempt. `selections[i]` is the option text picked for
/// question `i`; missing or `None` entries are wrong.
pub fn score_attempt(questions: &[Question], selections: &[Option<String>]) -> AttemptScore {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| {
            selections
                .get(*i)
                .and_then(|s| s.as_deref())
                .is_some_and(|s| s == q.answer)
        })
        .count();
    AttemptScore {
        correct,
        total: questions.len(),
    }
}
