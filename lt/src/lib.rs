//! LabelTool - report relevance annotation
//!
//! Walks every (report, user) pair of two fixed catalogs, one pair at a time,
//! and records which reports the operator judged relevant to which users.
//!
//! # Core Concepts
//!
//! - **Cursor**: the persisted (report index, user index, tutorial flag)
//!   triple. It moves row-major: all users for a report, then the next report.
//! - **Annotation map**: user id → set of relevant report ids. Marking is
//!   idempotent, so repeating an unsaved action is always safe.
//! - **Singleton records**: both live in one row each, addressed by a fixed
//!   id, and are re-read before every action.
//!
//! # Example
//!
//! ```ignore
//! use labeltool::{Decision, Session, SessionSettings};
//!
//! let backend = labelstore::open_backend(labelstore::BackendKind::Files, "data")?;
//! let session = Session::open(backend, SessionSettings::default())?;
//! session.decide(Decision::Relevant)?;
//! ```

pub mod annotations;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod render;
pub mod repl;
pub mod session;
pub mod view;

pub use annotations::{AnnotationMap, AnnotationStore};
pub use catalog::Catalog;
pub use config::Config;
pub use error::{LabelError, LabelResult};
pub use progress::{Cursor, DEFAULT_TUTORIAL_SKIP, Phase, ProgressTracker};
pub use session::{Decision, Outcome, Session, SessionSettings};
pub use view::{PairView, ProfileEntry, ProfileValue, Screen};
