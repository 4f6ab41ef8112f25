//! What the presentation layer is handed for each screen

use labelstore::{PROFILE_LIST_SEPARATOR, Report, User};

use crate::progress::Cursor;

/// One screen of the workflow
#[derive(Debug, Clone)]
pub enum Screen<'a> {
    Tutorial,
    Annotating(PairView<'a>),
    Complete { total_reports: usize, total_users: usize },
}

/// The (report, user) pair under the cursor
#[derive(Debug, Clone)]
pub struct PairView<'a> {
    pub report: &'a Report,
    pub user: &'a User,
    pub cursor: Cursor,
    pub total_reports: usize,
    pub total_users: usize,
}

impl<'a> PairView<'a> {
    /// Row-major progress over the whole grid, in `[0, 1)`
    pub fn progress_fraction(&self) -> f64 {
        self.cursor.progress_fraction(self.total_reports, self.total_users)
    }

    /// `Report 3 of 50 | User 2 of 10` (one-based)
    pub fn progress_line(&self) -> String {
        format!(
            "Report {} of {} | User {} of {}",
            self.cursor.report_index + 1,
            self.total_reports,
            self.cursor.user_index + 1,
            self.total_users
        )
    }

    pub fn report_caption(&self) -> String {
        format!(
            "ID: {} | Creation Date: {}",
            self.report.id,
            self.report.creation_date.format("%Y-%m-%d")
        )
    }

    pub fn user_caption(&self) -> String {
        format!("ID: {}", self.user.user_id)
    }

    pub fn profile_entries(&self) -> Vec<ProfileEntry> {
        self.user
            .profile
            .iter()
            .map(|(key, value)| ProfileEntry::new(key, value))
            .collect()
    }
}

/// A labelled profile field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub label: String,
    pub value: ProfileValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValue {
    Text(String),
    List(Vec<String>),
}

impl ProfileEntry {
    pub fn new(key: &str, raw: &str) -> Self {
        let value = if raw.contains(PROFILE_LIST_SEPARATOR) {
            ProfileValue::List(raw.split(PROFILE_LIST_SEPARATOR).map(|s| s.trim().to_string()).collect())
        } else {
            ProfileValue::Text(raw.to_string())
        };
        Self {
            label: field_label(key),
            value,
        }
    }

    /// Value as a single display string; lists are comma separated
    pub fn display_value(&self) -> String {
        match &self.value {
            ProfileValue::Text(s) => s.clone(),
            ProfileValue::List(items) => items.join(", "),
        }
    }
}

/// `job_title` -> `Job title`
pub fn field_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
