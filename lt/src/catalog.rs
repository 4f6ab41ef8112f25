//! Ordered report and user catalogs for one session

use labelstore::{CatalogSource, Report, User};
use tracing::{debug, info};

use crate::error::{LabelError, LabelResult};

/// The two collections being traversed
///
/// A record's traversal index is its position here, not its id.
#[derive(Debug, Clone)]
pub struct Catalog {
    reports: Vec<Report>,
    users: Vec<User>,
}

impl Catalog {
    /// Fetch both collections; failure or emptiness is `DataMissing`
    pub fn load<S: CatalogSource + ?Sized>(source: &S) -> LabelResult<Self> {
        debug!("Catalog::load: called");
        let reports = source
            .reports()
            .map_err(|e| LabelError::DataMissing(format!("reports: {}", e)))?;
        let users = source
            .users()
            .map_err(|e| LabelError::DataMissing(format!("users: {}", e)))?;
        let catalog = Self::new(reports, users)?;
        info!(
            reports = catalog.total_reports(),
            users = catalog.total_users(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn new(reports: Vec<Report>, users: Vec<User>) -> LabelResult<Self> {
        if reports.is_empty() {
            return Err(LabelError::DataMissing("no reports found".to_string()));
        }
        if users.is_empty() {
            return Err(LabelError::DataMissing("no users found".to_string()));
        }
        Ok(Self { reports, users })
    }

    pub fn report(&self, index: usize) -> Option<&Report> {
        self.reports.get(index)
    }

    pub fn user(&self, index: usize) -> Option<&User> {
        self.users.get(index)
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn total_reports(&self) -> usize {
        self.reports.len()
    }

    pub fn total_users(&self) -> usize {
        self.users.len()
    }
}
