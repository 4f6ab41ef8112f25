//! Progress tracking over the reports × users grid
//!
//! The cursor walks the grid row-major: every user is shown the current
//! report before the cursor moves to the next report. The cursor is a
//! singleton record owned by the backend; this module only reads it, applies
//! pure transitions and writes it back whole.

use labelstore::{CursorRecord, StateBackend};
use tracing::{debug, info, warn};

use crate::error::{LabelError, LabelResult};

/// Report index the tutorial exit jumps to by default
pub const DEFAULT_TUTORIAL_SKIP: usize = 10;

/// Position in the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub report_index: usize,
    pub user_index: usize,
    pub show_tutorial: bool,
}

/// Phase of the workflow derived from a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tutorial,
    Annotating,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Tutorial => write!(f, "tutorial"),
            Phase::Annotating => write!(f, "annotating"),
            Phase::Complete => write!(f, "complete"),
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            report_index: 0,
            user_index: 0,
            show_tutorial: true,
        }
    }
}

impl Cursor {
    pub fn new(report_index: usize, user_index: usize, show_tutorial: bool) -> Self {
        Self {
            report_index,
            user_index,
            show_tutorial,
        }
    }

    /// Move to the next user, wrapping to the next report
    ///
    /// Does not check the report bound; callers detect completion with
    /// [`Cursor::phase`].
    pub fn advance(self, total_users: usize) -> Self {
        let mut next = self;
        next.user_index += 1;
        if next.user_index >= total_users {
            next.user_index = 0;
            next.report_index += 1;
        }
        next
    }

    /// Leave the tutorial, jumping past the warm-up block of reports
    pub fn begin_tutorial_exit(self, skip_to: usize) -> Self {
        Self {
            report_index: skip_to,
            user_index: self.user_index,
            show_tutorial: false,
        }
    }

    pub fn phase(&self, total_reports: usize) -> Phase {
        if self.show_tutorial {
            Phase::Tutorial
        } else if self.report_index >= total_reports {
            Phase::Complete
        } else {
            Phase::Annotating
        }
    }

    /// Row-major fraction of the grid already judged
    ///
    /// Computed in `f64` since a hand-edited row can hold any index. A cursor
    /// past the last report reads as 1.0.
    pub fn progress_fraction(&self, total_reports: usize, total_users: usize) -> f64 {
        let cells = total_reports as f64 * total_users as f64;
        if cells == 0.0 {
            return 0.0;
        }
        let done = self.report_index as f64 * total_users as f64 + self.user_index as f64;
        (done / cells).min(1.0)
    }
}

impl TryFrom<CursorRecord> for Cursor {
    type Error = LabelError;

    fn try_from(record: CursorRecord) -> Result<Self, Self::Error> {
        let report_index = usize::try_from(record.report_id)
            .map_err(|_| LabelError::Persistence(format!("cursor report index {} is negative", record.report_id)))?;
        let user_index = usize::try_from(record.user_id)
            .map_err(|_| LabelError::Persistence(format!("cursor user index {} is negative", record.user_id)))?;
        Ok(Self::new(report_index, user_index, record.show_tutorial))
    }
}

impl From<Cursor> for CursorRecord {
    fn from(cursor: Cursor) -> Self {
        Self {
            report_id: cursor.report_index as i64,
            user_id: cursor.user_index as i64,
            show_tutorial: cursor.show_tutorial,
        }
    }
}

/// Loads and saves the singleton cursor row
pub struct ProgressTracker<'a, B: StateBackend + ?Sized> {
    backend: &'a B,
    row_id: i64,
}

impl<'a, B: StateBackend + ?Sized> ProgressTracker<'a, B> {
    pub fn new(backend: &'a B, row_id: i64) -> Self {
        Self { backend, row_id }
    }

    /// Read the cursor; a missing row is never default-constructed
    pub fn load(&self) -> LabelResult<Cursor> {
        debug!(row_id = self.row_id, "ProgressTracker::load: called");
        let record = self
            .backend
            .fetch_cursor(self.row_id)?
            .ok_or(LabelError::StateMissing { row_id: self.row_id })?;
        Cursor::try_from(record)
    }

    /// Overwrite the cursor row
    pub fn save(&self, cursor: &Cursor) -> LabelResult<()> {
        debug!(row_id = self.row_id, ?cursor, "ProgressTracker::save: called");
        self.backend
            .update_cursor(self.row_id, &CursorRecord::from(*cursor))
            .map_err(|e| {
                warn!(row_id = self.row_id, error = %e, "Failed to save cursor");
                LabelError::from(e)
            })?;
        info!(
            report_index = cursor.report_index,
            user_index = cursor.user_index,
            show_tutorial = cursor.show_tutorial,
            "Saved cursor"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelstore::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn test_tutorial_exit_from_start() {
        let next = Cursor::new(0, 0, true).begin_tutorial_exit(DEFAULT_TUTORIAL_SKIP);
        assert_eq!(next, Cursor::new(10, 0, false));
    }

    #[test]
    fn test_tutorial_exit_keeps_user_index() {
        let next = Cursor::new(2, 3, true).begin_tutorial_exit(4);
        assert_eq!(next, Cursor::new(4, 3, false));
    }

    #[test]
    fn test_linearization() {
        let cursor = Cursor::new(2, 3, false);
        assert!((cursor.progress_fraction(5, 10) - 0.46).abs() < 1e-12);
    }

    #[test]
    fn test_progress_fraction_huge_report_index() {
        let record = CursorRecord {
            report_id: 1 << 62,
            user_id: 0,
            show_tutorial: false,
        };
        let cursor = Cursor::try_from(record).unwrap();
        assert_eq!(cursor.phase(2), Phase::Complete);
        assert_eq!(cursor.progress_fraction(2, 4), 1.0);
    }

    #[test]
    fn test_progress_fraction_empty_grid() {
        assert_eq!(Cursor::default().progress_fraction(0, 0), 0.0);
    }

    #[test]
    fn test_phase_tutorial_wins() {
        assert_eq!(Cursor::new(99, 0, true).phase(5), Phase::Tutorial);
        assert_eq!(Cursor::new(4, 1, false).phase(5), Phase::Annotating);
        assert_eq!(Cursor::new(5, 0, false).phase(5), Phase::Complete);
    }

    #[test]
    fn test_negative_record_rejected() {
        let record = CursorRecord {
            report_id: -1,
            user_id: 0,
            show_tutorial: false,
        };
        assert!(matches!(Cursor::try_from(record), Err(LabelError::Persistence(_))));
    }

    #[test]
    fn test_load_missing_row_is_state_missing() {
        let store = MemoryStore::default();
        let tracker = ProgressTracker::new(&store, 1);
        assert!(matches!(tracker.load(), Err(LabelError::StateMissing { row_id: 1 })));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::default();
        store.upsert_cursor(7, &CursorRecord::default()).unwrap();
        let tracker = ProgressTracker::new(&store, 7);

        let cursor = Cursor::new(3, 1, false);
        tracker.save(&cursor).unwrap();
        assert_eq!(tracker.load().unwrap(), cursor);
    }

    #[test]
    fn test_save_failure_is_persistence_error() {
        let store = MemoryStore::default();
        store.upsert_cursor(1, &CursorRecord::default()).unwrap();
        store.set_fail_writes(true);
        let tracker = ProgressTracker::new(&store, 1);

        let err = tracker.save(&Cursor::new(1, 0, false)).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(tracker.load().unwrap(), Cursor::default());
    }

    proptest! {
        #[test]
        fn prop_advance_within_report(report in 0usize..1000, total_users in 2usize..500, offset in 0usize..500) {
            let user = offset % (total_users - 1);
            let next = Cursor::new(report, user, false).advance(total_users);
            prop_assert_eq!(next.user_index, user + 1);
            prop_assert_eq!(next.report_index, report);
        }

        #[test]
        fn prop_advance_wraps_on_last_user(report in 0usize..1000, total_users in 1usize..500) {
            let next = Cursor::new(report, total_users - 1, false).advance(total_users);
            prop_assert_eq!(next.user_index, 0);
            prop_assert_eq!(next.report_index, report + 1);
        }

        #[test]
        fn prop_complete_at_report_bound(total_reports in 0usize..1000, user in 0usize..1000) {
            let cursor = Cursor::new(total_reports, user, false);
            prop_assert_eq!(cursor.phase(total_reports), Phase::Complete);
        }

        #[test]
        fn prop_full_walk_visits_every_cell(total_reports in 1usize..20, total_users in 1usize..20) {
            let mut cursor = Cursor::new(0, 0, false);
            let mut steps = 0;
            while cursor.phase(total_reports) == Phase::Annotating {
                prop_assert!(cursor.user_index < total_users);
                cursor = cursor.advance(total_users);
                steps += 1;
            }
            prop_assert_eq!(steps, total_reports * total_users);
            prop_assert_eq!(cursor, Cursor::new(total_reports, 0, false));
            prop_assert!((cursor.progress_fraction(total_reports, total_users) - 1.0).abs() < 1e-12);
        }
    }
}
