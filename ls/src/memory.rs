//! In-memory backend for tests and dry runs

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::backend::{CatalogSource, StateBackend};
use crate::error::{StoreError, StoreResult};
use crate::records::{AnnotationData, CursorRecord, Report, User};

/// Store kept entirely in memory
///
/// Writes can be made to fail on demand to exercise the persistence error
/// paths of callers.
#[derive(Default)]
pub struct MemoryStore {
    reports: Vec<Report>,
    users: Vec<User>,
    cursors: RefCell<BTreeMap<i64, CursorRecord>>,
    annotations: RefCell<BTreeMap<i64, AnnotationData>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new(reports: Vec<Report>, users: Vec<User>) -> Self {
        Self {
            reports,
            users,
            ..Default::default()
        }
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl CatalogSource for MemoryStore {
    fn reports(&self) -> StoreResult<Vec<Report>> {
        Ok(self.reports.clone())
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.clone())
    }
}

impl StateBackend for MemoryStore {
    fn fetch_cursor(&self, row_id: i64) -> StoreResult<Option<CursorRecord>> {
        Ok(self.cursors.borrow().get(&row_id).copied())
    }

    fn update_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()> {
        if !self.cursors.borrow().contains_key(&row_id) {
            return Err(StoreError::NotFound { table: "state", id: row_id });
        }
        self.upsert_cursor(row_id, record)
    }

    fn upsert_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()> {
        self.check_write()?;
        self.cursors.borrow_mut().insert(row_id, *record);
        Ok(())
    }

    fn fetch_annotations(&self, row_id: i64) -> StoreResult<Option<AnnotationData>> {
        Ok(self.annotations.borrow().get(&row_id).cloned())
    }

    fn update_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()> {
        if !self.annotations.borrow().contains_key(&row_id) {
            return Err(StoreError::NotFound {
                table: "annotations",
                id: row_id,
            });
        }
        self.upsert_annotations(row_id, data)
    }

    fn upsert_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()> {
        self.check_write()?;
        self.annotations.borrow_mut().insert(row_id, data.clone());
        Ok(())
    }
}
