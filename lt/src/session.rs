//! One operator session: catalog + backend + the actions that move the cursor
//!
//! Every action re-reads the cursor and the annotation map from the backend
//! before changing them, so out-of-band edits to either record are picked up.
//! An action that fails to persist leaves the backend at the last committed
//! cursor; repeating it is safe because marking is idempotent.

use labelstore::{AnnotationData, LabelBackend};
use tracing::{debug, info};

use crate::annotations::{AnnotationMap, AnnotationStore};
use crate::catalog::Catalog;
use crate::error::{LabelError, LabelResult};
use crate::progress::{Cursor, DEFAULT_TUTORIAL_SKIP, Phase, ProgressTracker};
use crate::view::{PairView, Screen};

/// Fixed row ids and the tutorial skip target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub state_row_id: i64,
    pub annotations_row_id: i64,
    pub tutorial_skip: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            state_row_id: labelstore::DEFAULT_STATE_ROW_ID,
            annotations_row_id: labelstore::DEFAULT_ANNOTATIONS_ROW_ID,
            tutorial_skip: DEFAULT_TUTORIAL_SKIP,
        }
    }
}

/// The operator's judgment of the current pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Relevant,
    NotRelevant,
}

/// What an action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The cursor moved and was persisted
    Advanced { from: Cursor, to: Cursor },
    /// The action does not apply in this phase; nothing was written
    Ignored(Phase),
}

pub struct Session {
    backend: Box<dyn LabelBackend>,
    catalog: Catalog,
    settings: SessionSettings,
}

impl Session {
    /// Load the catalog from the backend and bind the session to it
    pub fn open(backend: Box<dyn LabelBackend>, settings: SessionSettings) -> LabelResult<Self> {
        let catalog = Catalog::load(backend.as_ref())?;
        Ok(Self::with_catalog(backend, catalog, settings))
    }

    /// Bind to a catalog loaded from elsewhere
    pub fn with_catalog(backend: Box<dyn LabelBackend>, catalog: Catalog, settings: SessionSettings) -> Self {
        debug!(?settings, "Session::with_catalog: called");
        Self {
            backend,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn tracker(&self) -> ProgressTracker<'_, dyn LabelBackend> {
        ProgressTracker::new(self.backend.as_ref(), self.settings.state_row_id)
    }

    fn annotations(&self) -> AnnotationStore<'_, dyn LabelBackend> {
        AnnotationStore::new(self.backend.as_ref(), self.settings.annotations_row_id)
    }

    /// Current cursor, read fresh
    pub fn cursor(&self) -> LabelResult<Cursor> {
        self.tracker().load()
    }

    pub fn phase(&self) -> LabelResult<Phase> {
        Ok(self.cursor()?.phase(self.catalog.total_reports()))
    }

    /// Build the screen for the stored cursor
    pub fn screen(&self) -> LabelResult<Screen<'_>> {
        let cursor = self.cursor()?;
        match cursor.phase(self.catalog.total_reports()) {
            Phase::Tutorial => Ok(Screen::Tutorial),
            Phase::Complete => Ok(Screen::Complete {
                total_reports: self.catalog.total_reports(),
                total_users: self.catalog.total_users(),
            }),
            Phase::Annotating => self.pair_view(cursor).map(Screen::Annotating),
        }
    }

    fn pair_view(&self, cursor: Cursor) -> LabelResult<PairView<'_>> {
        let report = self
            .catalog
            .report(cursor.report_index)
            .ok_or_else(|| LabelError::DataMissing(format!("no report at index {}", cursor.report_index)))?;
        let user = self
            .catalog
            .user(cursor.user_index)
            .ok_or_else(|| LabelError::DataMissing(format!("no user at index {}", cursor.user_index)))?;
        Ok(PairView {
            report,
            user,
            cursor,
            total_reports: self.catalog.total_reports(),
            total_users: self.catalog.total_users(),
        })
    }

    /// Leave the tutorial
    pub fn start(&self) -> LabelResult<Outcome> {
        let tracker = self.tracker();
        let cursor = tracker.load()?;
        if !cursor.show_tutorial {
            debug!(?cursor, "start: tutorial already finished");
            return Ok(Outcome::Ignored(cursor.phase(self.catalog.total_reports())));
        }
        let next = cursor.begin_tutorial_exit(self.settings.tutorial_skip);
        tracker.save(&next)?;
        info!(report_index = next.report_index, "Tutorial finished");
        Ok(Outcome::Advanced { from: cursor, to: next })
    }

    /// Judge the current pair and move on
    ///
    /// The annotation is written before the cursor. If the cursor write fails
    /// the annotation stays, and repeating the decision is a no-op for it.
    pub fn decide(&self, decision: Decision) -> LabelResult<Outcome> {
        let tracker = self.tracker();
        let cursor = tracker.load()?;
        let phase = cursor.phase(self.catalog.total_reports());
        if phase != Phase::Annotating {
            debug!(?decision, %phase, "decide: ignored outside annotation");
            return Ok(Outcome::Ignored(phase));
        }

        let view = self.pair_view(cursor)?;
        if decision == Decision::Relevant {
            let annotations = self.annotations();
            let mut map = annotations.load(self.catalog.users())?;
            let added = map.mark_relevant(view.user.user_id, view.report.id);
            debug!(
                user_id = view.user.user_id,
                report_id = view.report.id,
                added,
                "decide: marked relevant"
            );
            annotations.save(&map)?;
        }

        let next = cursor.advance(self.catalog.total_users());
        tracker.save(&next)?;
        if next.phase(self.catalog.total_reports()) == Phase::Complete {
            info!("All pairs annotated");
        }
        Ok(Outcome::Advanced { from: cursor, to: next })
    }

    /// Current annotation map
    pub fn annotation_map(&self) -> LabelResult<AnnotationMap> {
        self.annotations().load(self.catalog.users())
    }

    /// Annotation map in wire shape, for export
    pub fn export(&self) -> LabelResult<AnnotationData> {
        Ok(self.annotation_map()?.to_data())
    }
}
