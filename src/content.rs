use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One of the three independent record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Quiz,
    Lesson,
    Game,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Quiz, Category::Lesson, Category::Game];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Quiz => "quiz",
            Category::Lesson => "lesson",
            Category::Game => "game",
        }
    }

    /// Table name, which doubles as the snapshot key.
    pub fn table(self) -> &'static str {
        match self {
            Category::Quiz => "quizzes",
            Category::Lesson => "lessons",
            Category::Game => "games",
        }
    }

    /// Accepts both the singular form and the snapshot key.
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiz" | "quizzes" => Some(Category::Quiz),
            "lesson" | "lessons" => Some(Category::Lesson),
            "game" | "games" => Some(Category::Game),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored quiz, lesson or game.
///
/// `title`, `grade` and `subject` are free-text labels and together form the
/// record's identity for import deduplication. Everything else the caller
/// supplies (questions, lesson content, game payload) lives in `fields` and is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub subject: String,
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ContentRecord {
    pub fn new(
        title: impl Into<String>,
        subject: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        ContentRecord {
            id: None,
            title: title.into(),
            subject: subject.into(),
            grade: grade.into(),
            updated_at: None,
            fields: Map::new(),
        }
    }

    /// Adds an opaque field. Keys the store owns (see [`RESERVED_FIELDS`]) are
    /// ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.fields.insert(key, value);
        }
        self
    }

    /// Opaque fields with any store-owned key removed; this is what gets
    /// persisted in the `body` column.
    pub fn body_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Builds a record from caller-supplied JSON.
    ///
    /// Any `id` or `updatedAt` in the input is dropped; the store assigns both.
    /// On failure returns the name of the first missing label (`"record"` when
    /// the value is not an object). Empty strings and non-string values count
    /// as missing.
    pub fn from_json(value: Value) -> Result<ContentRecord, &'static str> {
        let Value::Object(mut map) = value else {
            return Err("record");
        };
        let title = take_label(&mut map, "title")?;
        let subject = take_label(&mut map, "subject")?;
        let grade = take_label(&mut map, "grade")?;
        map.retain(|k, _| !is_reserved(k));
        Ok(ContentRecord {
            id: None,
            title,
            subject,
            grade,
            updated_at: None,
            fields: map,
        })
    }

    /// `title|grade|subject`, joined literally.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.title, &self.grade, &self.subject)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Keys held in dedicated columns, never in the opaque body.
pub const RESERVED_FIELDS: [&str; 5] = ["id", "title", "subject", "grade", "updatedAt"];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_FIELDS.contains(&key)
}

pub fn dedup_key(title: &str, grade: &str, subject: &str) -> String {
    format!("{}|{}|{}", title, grade, subject)
}

fn take_label(map: &mut Map<String, Value>, key: &'static str) -> Result<String, &'static str> {
    match map.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => Err(key),
    }
}
