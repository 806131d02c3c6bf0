use crate::content::Category;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the offline content store.
///
/// A lookup that finds nothing is not an error; `get_by_id` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The local database could not be opened or used (quota, permissions, missing engine).
    #[error("offline storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A snapshot could not be parsed, read, or written.
    #[error("import failed: {0}")]
    Import(String),

    /// A directly added record lacks one of its identifying labels.
    #[error("malformed {category} record: missing {field}")]
    MalformedRecord {
        category: Category,
        field: &'static str,
    },

    #[error("export failed: {0}")]
    Export(String),
}

impl StoreError {
    /// Stable code used on the sidecar wire.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::StorageUnavailable(_) => "storage_unavailable",
            StoreError::Import(_) => "import_failed",
            StoreError::MalformedRecord { .. } => "malformed_record",
            StoreError::Export(_) => "export_failed",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}
