//! LabelStore - persistence for the relevance annotation workflow
//!
//! Holds the two singleton state records (the traversal cursor and the
//! annotation map) and serves the ordered report and user catalogs. Each
//! record is addressed by a fixed row id and is always overwritten whole.
//!
//! # Backends
//!
//! ```text
//! sqlite:  labeltool.db
//!          ├── reports      (ordered by position)
//!          ├── users        (ordered by position, profile as JSON)
//!          ├── state        (id, report_id, user_id, show_tutorial)
//!          └── annotations  (id, data JSON)
//!
//! files:   data/
//!          ├── reports.json | reports.yaml
//!          ├── users.json   | users.yaml
//!          ├── state.json        [{ "id": 1, "report_id": 0, ... }]
//!          └── annotations.json  [{ "id": 1, "data": { ... } }]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use labelstore::{BackendKind, StateBackend, open_backend};
//!
//! let store = open_backend(BackendKind::Sqlite, "labeltool.db")?;
//! let cursor = store.fetch_cursor(labelstore::DEFAULT_STATE_ROW_ID)?;
//! ```

pub mod error;

mod backend;
mod files;
mod memory;
mod records;
mod sqlite;

pub use backend::{BackendKind, CatalogSource, LabelBackend, StateBackend, open_backend};
pub use error::{StoreError, StoreResult};
pub use files::{FileStore, read_collection};
pub use memory::MemoryStore;
pub use records::{AnnotationData, AnnotationEntry, CursorRecord, Report, User};
pub use sqlite::SqliteStore;

/// Default fixed id of the cursor row
pub const DEFAULT_STATE_ROW_ID: i64 = 1;

/// Default fixed id of the annotation row
pub const DEFAULT_ANNOTATIONS_ROW_ID: i64 = 1;

/// Separator that turns a profile value into a list
pub const PROFILE_LIST_SEPARATOR: char = ';';
