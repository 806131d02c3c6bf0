//! Snapshot bundle format and file delivery.
//!
//! A snapshot is the JSON document exchanged between devices:
//!
//! ```json
//! { "quizzes": [...], "lessons": [...], "games": [...], "exportedAt": "2026-10-19T08:30:00.000Z" }
//! ```
//!
//! All three arrays are always written. On import each is optional.

use crate::content::Category;
use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const FILE_PREFIX: &str = "arise-content-export-";

/// Exports always carry all three arrays and an RFC 3339 `exportedAt`. When
/// reading, missing arrays default to empty and `exportedAt` may be any JSON
/// value (older exports wrote epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub quizzes: Vec<Value>,
    #[serde(default)]
    pub lessons: Vec<Value>,
    #[serde(default)]
    pub games: Vec<Value>,
    #[serde(default)]
    pub exported_at: Value,
}

impl Snapshot {
    pub fn new(exported_at: DateTime<Utc>) -> Self {
        Snapshot {
            quizzes: Vec::new(),
            lessons: Vec::new(),
            games: Vec::new(),
            exported_at: Value::String(format_exported_at(exported_at)),
        }
    }

    pub fn records(&self, category: Category) -> &[Value] {
        match category {
            Category::Quiz => &self.quizzes,
            Category::Lesson => &self.lessons,
            Category::Game => &self.games,
        }
    }

    pub fn records_mut(&mut self, category: Category) -> &mut Vec<Value> {
        match category {
            Category::Quiz => &mut self.quizzes,
            Category::Lesson => &mut self.lessons,
            Category::Game => &mut self.games,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_text(&self, pretty: bool) -> anyhow::Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        text.context("failed to serialize snapshot")
    }
}

/// Explicit per-category arrays to export instead of the stored tables.
#[derive(Debug, Clone, Default)]
pub struct ExportSelection {
    pub quizzes: Option<Vec<Value>>,
    pub lessons: Option<Vec<Value>>,
    pub games: Option<Vec<Value>>,
}

impl ExportSelection {
    pub fn all() -> Self {
        ExportSelection::default()
    }

    pub fn with(mut self, category: Category, records: Vec<Value>) -> Self {
        match category {
            Category::Quiz => self.quizzes = Some(records),
            Category::Lesson => self.lessons = Some(records),
            Category::Game => self.games = Some(records),
        }
        self
    }

    pub fn override_for(&self, category: Category) -> Option<&[Value]> {
        match category {
            Category::Quiz => self.quizzes.as_deref(),
            Category::Lesson => self.lessons.as_deref(),
            Category::Game => self.games.as_deref(),
        }
    }

    /// Reads overrides from an object keyed by `quizzes` / `lessons` / `games`.
    /// Keys that are absent or not arrays fall back to the stored table.
    pub fn from_json(value: &Value) -> Self {
        let mut sel = ExportSelection::default();
        for category in Category::ALL {
            if let Some(arr) = value.get(category.table()).and_then(|v| v.as_array()) {
                sel = sel.with(category, arr.clone());
            }
        }
        sel
    }
}

pub fn format_exported_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `arise-content-export-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}{}.json", FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// Writes snapshot text to `target`.
///
/// When `target` is an existing directory the conventional file name for
/// `date` is used inside it. The text goes to a temporary sibling first and is
/// renamed into place.
pub fn write_snapshot_file(target: &Path, text: &str, date: NaiveDate) -> anyhow::Result<PathBuf> {
    let out_path = if target.is_dir() {
        target.join(export_file_name(date))
    } else {
        target.to_path_buf()
    };

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }

    write_atomically(&out_path, text)?;
    Ok(out_path)
}

/// Writes to `<name>.writing` and renames over `out_path`; the temporary file
/// is removed if any step fails.
fn write_atomically(out_path: &Path, text: &str) -> anyhow::Result<()> {
    let file_name = out_path
        .file_name()
        .ok_or_else(|| anyhow!("export path has no file name: {}", out_path.to_string_lossy()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".writing");
    let tmp_path = out_path.with_file_name(tmp_name);

    let written = write_then_rename(&tmp_path, out_path, text);
    if written.is_err() && tmp_path.exists() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    written
}

fn write_then_rename(tmp_path: &Path, out_path: &Path, text: &str) -> anyhow::Result<()> {
    let mut out = File::create(tmp_path).with_context(|| {
        format!("failed to create output file {}", tmp_path.to_string_lossy())
    })?;
    out.write_all(text.as_bytes())
        .context("failed to write snapshot")?;
    out.flush().context("failed to flush snapshot")?;
    drop(out);

    std::fs::rename(tmp_path, out_path).with_context(|| {
        format!("failed to move snapshot to {}", out_path.to_string_lossy())
    })
}

pub fn read_snapshot_file(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read snapshot {}", path.to_string_lossy()))?;
    String::from_utf8(bytes).context("snapshot is not valid UTF-8")
}
