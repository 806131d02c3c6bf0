//! Offline content cache for the Arise learning app.
//!
//! Quizzes, lessons and games are kept in a local SQLite database so the app
//! works without connectivity. Content moves between devices as JSON snapshots
//! (see [`snapshot`]); imports deduplicate on the record's title, grade and
//! subject. The `arise-contentd` binary exposes the store to the host shell
//! over newline-delimited JSON (see [`ipc`]).

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod ipc;
pub mod quiz;
pub mod snapshot;
pub mod store;

pub use content::{Category, ContentRecord};
pub use error::{Result, StoreError};
pub use snapshot::{ExportSelection, Snapshot};
pub use store::{CategoryImport, ContentStore, ImportSummary};
