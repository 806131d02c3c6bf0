use crate::content::Category;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "offline-content.sqlite3";
const SCHEMA_VERSION: i64 = 2;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_meta(
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        )",
        [],
    )?;

    for category in Category::ALL {
        let table = category.table();
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table}(
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    grade TEXT NOT NULL,
                    updated_at INTEGER,
                    body TEXT
                )"
            ),
            [],
        )?;
        // v1 stores kept only the indexed columns.
        ensure_body_column(conn, table)?;
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_subject ON {table}(subject)"),
            [],
        )?;
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_natural_key ON {table}(title, grade, subject)"
            ),
            [],
        )?;
    }

    let current = schema_version(conn)?;
    if current != Some(SCHEMA_VERSION) {
        conn.execute(
            "INSERT INTO schema_meta(key, value) VALUES('schema_version', ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

pub fn schema_version(conn: &Connection) -> anyhow::Result<Option<i64>> {
    let v = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

fn ensure_body_column(conn: &Connection, table: &str) -> anyhow::Result<()> {
    if table_has_column(conn, table, "body")? {
        return Ok(());
    }
    conn.execute(&format!("ALTER TABLE {table} ADD COLUMN body TEXT"), [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
