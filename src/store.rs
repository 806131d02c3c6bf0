//! Local offline content store.
//!
//! Three independent tables (quizzes, lessons, games) mirror a subset of
//! server content so the app keeps working without a network. Direct adds
//! never deduplicate; snapshot imports do, keyed on `title|grade|subject`.
//!
//! The store assumes a single writer. The sidecar loop handles one request at
//! a time, so two imports can never interleave their read-then-insert steps.

use crate::content::{dedup_key, is_reserved, Category, ContentRecord};
use crate::db;
use crate::error::{Result, StoreError};
use crate::snapshot::{self, ExportSelection, Snapshot};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct ContentStore {
    conn: Connection,
    location: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryImport {
    pub inserted: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

/// Per-category outcome of one snapshot import.
///
/// A category absent from the snapshot stays at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub quizzes: CategoryImport,
    pub lessons: CategoryImport,
    pub games: CategoryImport,
}

impl ImportSummary {
    pub fn get(&self, category: Category) -> CategoryImport {
        match category {
            Category::Quiz => self.quizzes,
            Category::Lesson => self.lessons,
            Category::Game => self.games,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut CategoryImport {
        match category {
            Category::Quiz => &mut self.quizzes,
            Category::Lesson => &mut self.lessons,
            Category::Game => &mut self.games,
        }
    }

    pub fn inserted(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).inserted).sum()
    }

    pub fn skipped(&self) -> usize {
        Category::ALL
            .iter()
            .map(|c| {
                let t = self.get(*c);
                t.duplicates + t.malformed
            })
            .sum()
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ContentStore {
    pub fn open(workspace: &Path) -> Result<Self> {
        let conn = db::open_db(workspace)
            .map_err(|e| StoreError::StorageUnavailable(format!("{e:#}")))?;
        tracing::info!(workspace = %workspace.display(), "offline content store opened");
        Ok(ContentStore {
            conn,
            location: Some(workspace.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn =
            db::open_in_memory().map_err(|e| StoreError::StorageUnavailable(format!("{e:#}")))?;
        Ok(ContentStore {
            conn,
            location: None,
        })
    }

    /// Workspace directory, `None` for in-memory stores.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn close(self) -> Result<()> {
        let location = self.location.clone();
        self.conn.close().map_err(|(_, e)| StoreError::from(e))?;
        if let Some(p) = location {
            tracing::info!(workspace = %p.display(), "offline content store closed");
        }
        Ok(())
    }

    /// Inserts `record` as a new row and returns its local id.
    ///
    /// No uniqueness check: adding the same record twice yields two rows.
    pub fn add(&self, category: Category, record: &ContentRecord) -> Result<i64> {
        let body = serde_json::to_string(&record.body_fields())
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        self.conn.execute(
            &format!(
                "INSERT INTO {}(title, subject, grade, updated_at, body) VALUES(?, ?, ?, ?, ?)",
                category.table()
            ),
            (
                &record.title,
                &record.subject,
                &record.grade,
                now_millis(),
                &body,
            ),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Validating variant of [`add`](Self::add) for untyped input.
    pub fn add_json(&self, category: Category, value: Value) -> Result<i64> {
        let record = ContentRecord::from_json(value)
            .map_err(|field| StoreError::MalformedRecord { category, field })?;
        self.add(category, &record)
    }

    pub fn get_by_id(&self, category: Category, id: i64) -> Result<Option<ContentRecord>> {
        let rec = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, title, subject, grade, updated_at, body FROM {} WHERE id = ?",
                    category.table()
                ),
                [id],
                record_from_row,
            )
            .optional()?;
        Ok(rec)
    }

    /// All records in insertion order.
    pub fn get_all(&self, category: Category) -> Result<Vec<ContentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, title, subject, grade, updated_at, body FROM {} ORDER BY id",
            category.table()
        ))?;
        let rows = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Records whose subject equals `subject` exactly.
    pub fn get_by_subject(&self, category: Category, subject: &str) -> Result<Vec<ContentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, title, subject, grade, updated_at, body FROM {} WHERE subject = ? ORDER BY id",
            category.table()
        ))?;
        let rows = stmt
            .query_map([subject], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self, category: Category) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", category.table()),
            [],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn import_snapshot_text(&self, text: &str) -> Result<ImportSummary> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StoreError::Import(format!("snapshot is not valid JSON: {e}")))?;
        self.import_snapshot(&value)
    }

    pub fn import_snapshot_file(&self, path: &Path) -> Result<ImportSummary> {
        let text =
            snapshot::read_snapshot_file(path).map_err(|e| StoreError::Import(format!("{e:#}")))?;
        self.import_snapshot_text(&text)
    }

    /// Merges a parsed snapshot into the store.
    ///
    /// Records missing a label are dropped and counted as malformed. A record
    /// whose key already exists, or appeared earlier in the same batch, is
    /// counted as a duplicate. Each category is written in its own
    /// transaction; a failure in a later category leaves earlier ones committed.
    pub fn import_snapshot(&self, snapshot: &Value) -> Result<ImportSummary> {
        let Some(obj) = snapshot.as_object() else {
            return Err(StoreError::Import(
                "snapshot must be a JSON object".to_string(),
            ));
        };

        let mut summary = ImportSummary::default();
        for category in Category::ALL {
            let Some(items) = obj.get(category.table()).and_then(|v| v.as_array()) else {
                continue;
            };
            self.import_category(category, items, summary.get_mut(category))?;
        }

        tracing::info!(
            inserted = summary.inserted(),
            skipped = summary.skipped(),
            "snapshot imported"
        );
        Ok(summary)
    }

    fn import_category(
        &self,
        category: Category,
        items: &[Value],
        tally: &mut CategoryImport,
    ) -> Result<()> {
        let mut seen = self.existing_keys(category)?;
        let mut pending: Vec<ContentRecord> = Vec::new();
        for item in items {
            let record = match ContentRecord::from_json(item.clone()) {
                Ok(r) => r,
                Err(field) => {
                    tracing::debug!(%category, field, "dropping malformed import record");
                    tally.malformed += 1;
                    continue;
                }
            };
            if !seen.insert(record.dedup_key()) {
                tally.duplicates += 1;
                continue;
            }
            pending.push(record);
        }

        if pending.is_empty() {
            return Ok(());
        }

        let write_err = |e: rusqlite::Error| StoreError::Import(format!("{}: {e}", category.table()));
        let tx = self.conn.unchecked_transaction().map_err(write_err)?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {}(title, subject, grade, updated_at, body) VALUES(?, ?, ?, ?, ?)",
                    category.table()
                ))
                .map_err(write_err)?;
            let stamped_at = now_millis();
            for rec in &pending {
                let body = serde_json::to_string(&rec.body_fields())
                    .map_err(|e| StoreError::Import(e.to_string()))?;
                stmt.execute((&rec.title, &rec.subject, &rec.grade, stamped_at, &body))
                    .map_err(write_err)?;
            }
        }
        tx.commit().map_err(write_err)?;

        tally.inserted = pending.len();
        Ok(())
    }

    fn existing_keys(&self, category: Category) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT title, grade, subject FROM {}", category.table()))?;
        let keys = stmt
            .query_map([], |row| {
                let title: String = row.get(0)?;
                let grade: String = row.get(1)?;
                let subject: String = row.get(2)?;
                Ok(dedup_key(&title, &grade, &subject))
            })?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(keys)
    }

    /// Assembles a snapshot of every category, or of the caller's override
    /// arrays where given. Stored data is not touched.
    pub fn export_snapshot(&self, selection: &ExportSelection) -> Result<Snapshot> {
        let mut snap = Snapshot::new(Utc::now());
        for category in Category::ALL {
            let records = match selection.override_for(category) {
                Some(items) => items.to_vec(),
                None => self
                    .get_all(category)?
                    .iter()
                    .map(ContentRecord::to_json)
                    .collect(),
            };
            *snap.records_mut(category) = records;
        }
        Ok(snap)
    }

    /// Exports and writes the snapshot to `target` (a file, or a directory that
    /// receives the conventionally named file). Returns the written path.
    pub fn export_snapshot_file(
        &self,
        selection: &ExportSelection,
        target: &Path,
        pretty: bool,
    ) -> Result<(Snapshot, PathBuf)> {
        let snap = self.export_snapshot(selection)?;
        let text = snap
            .to_text(pretty)
            .map_err(|e| StoreError::Export(format!("{e:#}")))?;
        let path = snapshot::write_snapshot_file(target, &text, Utc::now().date_naive())
            .map_err(|e| StoreError::Export(format!("{e:#}")))?;
        tracing::info!(path = %path.display(), "snapshot exported");
        Ok((snap, path))
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ContentRecord> {
    let body: Option<String> = row.get(5)?;
    let mut fields = match body {
        Some(text) => serde_json::from_str::<Map<String, Value>>(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        None => Map::new(),
    };
    // Columns win over anything an older build let into the body.
    fields.retain(|k, _| !is_reserved(k));
    Ok(ContentRecord {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        subject: row.get(2)?,
        grade: row.get(3)?,
        updated_at: row.get(4)?,
        fields,
    })
}
