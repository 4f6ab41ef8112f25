//! Backend traits and selection

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreResult;
use crate::files::FileStore;
use crate::records::{AnnotationData, CursorRecord, Report, User};
use crate::sqlite::SqliteStore;

/// Read/write access to the singleton state rows
///
/// `fetch_*` returns `Ok(None)` when the row does not exist. `update_*`
/// overwrites an existing row and fails with `NotFound` otherwise;
/// `upsert_*` is reserved for provisioning.
pub trait StateBackend {
    fn fetch_cursor(&self, row_id: i64) -> StoreResult<Option<CursorRecord>>;

    fn update_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()>;

    fn upsert_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()>;

    fn fetch_annotations(&self, row_id: i64) -> StoreResult<Option<AnnotationData>>;

    fn update_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()>;

    fn upsert_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()>;
}

/// Ordered report and user collections
///
/// Implementations must return the same order on every call.
pub trait CatalogSource {
    fn reports(&self) -> StoreResult<Vec<Report>>;

    fn users(&self) -> StoreResult<Vec<User>>;
}

/// A backend that serves both state and catalog
pub trait LabelBackend: StateBackend + CatalogSource {}

impl<T: StateBackend + CatalogSource> LabelBackend for T {}

/// Which backend to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Files,
}

/// Open a backend at `path` (database file or data directory)
pub fn open_backend(kind: BackendKind, path: impl AsRef<Path>) -> StoreResult<Box<dyn LabelBackend>> {
    debug!(?kind, path = %path.as_ref().display(), "open_backend: called");
    match kind {
        BackendKind::Sqlite => Ok(Box::new(SqliteStore::open(path)?)),
        BackendKind::Files => Ok(Box::new(FileStore::open(path)?)),
    }
}
