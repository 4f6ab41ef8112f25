//! Flat-file backend
//!
//! Catalogs are JSON arrays or YAML lists. The state rows live in small JSON
//! tables (`state.json`, `annotations.json`) so several fixed ids can share a
//! directory. Writes take an exclusive advisory lock on `.lock` and replace
//! the table file by rename.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{CatalogSource, StateBackend};
use crate::error::{StoreError, StoreResult};
use crate::records::{AnnotationData, CursorRecord, Report, User, null_as_empty};

const STATE_FILE: &str = "state.json";
const ANNOTATIONS_FILE: &str = "annotations.json";
const LOCK_FILE: &str = ".lock";
const CATALOG_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateRow {
    id: i64,
    #[serde(flatten)]
    record: CursorRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotationRow {
    id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    data: AnnotationData,
}

/// Read a JSON array or YAML list, chosen by file extension
pub fn read_collection<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    debug!(path = %path.display(), "read_collection: called");
    let content = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        _ => Ok(serde_json::from_str(&content)?),
    }
}

/// Store backed by a directory of files
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open or create the data directory
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    fn catalog_path(&self, stem: &str) -> StoreResult<PathBuf> {
        CATALOG_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", stem, ext)))
            .find(|p| p.exists())
            .ok_or_else(|| StoreError::MissingCollection(self.dir.join(format!("{}.json", stem)).display().to_string()))
    }

    fn read_table<T: DeserializeOwned>(&self, name: &str) -> StoreResult<Vec<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_table<T: Serialize>(&self, name: &str, rows: &[T]) -> StoreResult<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        fs::write(&tmp, serde_json::to_string_pretty(rows)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Read-modify-write a table while holding the directory lock
    fn with_table<T, F>(&self, name: &str, mutate: F) -> StoreResult<()>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> StoreResult<()>,
    {
        let lock = self.lock()?;
        let mut rows = self.read_table::<T>(name)?;
        mutate(&mut rows)?;
        self.write_table(name, &rows)?;
        FileExt::unlock(&lock)?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        FileExt::lock_exclusive(&file)?;
        Ok(file)
    }

    /// Write a catalog file in JSON, replacing any existing one
    pub fn write_catalog<T: Serialize>(&self, stem: &str, rows: &[T]) -> StoreResult<PathBuf> {
        for ext in CATALOG_EXTENSIONS {
            let existing = self.dir.join(format!("{}.{}", stem, ext));
            if existing.exists() {
                fs::remove_file(&existing)?;
            }
        }
        let path = self.dir.join(format!("{}.json", stem));
        fs::write(&path, serde_json::to_string_pretty(rows)?)?;
        info!(path = %path.display(), count = rows.len(), "Wrote catalog");
        Ok(path)
    }
}

impl CatalogSource for FileStore {
    fn reports(&self) -> StoreResult<Vec<Report>> {
        read_collection(&self.catalog_path("reports")?)
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        read_collection(&self.catalog_path("users")?)
    }
}

impl StateBackend for FileStore {
    fn fetch_cursor(&self, row_id: i64) -> StoreResult<Option<CursorRecord>> {
        debug!(row_id, "fetch_cursor: called");
        let rows: Vec<StateRow> = self.read_table(STATE_FILE)?;
        Ok(rows.into_iter().find(|r| r.id == row_id).map(|r| r.record))
    }

    fn update_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()> {
        debug!(row_id, ?record, "update_cursor: called");
        self.with_table::<StateRow, _>(STATE_FILE, |rows| {
            let row = rows
                .iter_mut()
                .find(|r| r.id == row_id)
                .ok_or(StoreError::NotFound { table: "state", id: row_id })?;
            row.record = *record;
            Ok(())
        })
    }

    fn upsert_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()> {
        debug!(row_id, ?record, "upsert_cursor: called");
        self.with_table::<StateRow, _>(STATE_FILE, |rows| {
            match rows.iter_mut().find(|r| r.id == row_id) {
                Some(row) => row.record = *record,
                None => rows.push(StateRow {
                    id: row_id,
                    record: *record,
                }),
            }
            Ok(())
        })
    }

    fn fetch_annotations(&self, row_id: i64) -> StoreResult<Option<AnnotationData>> {
        debug!(row_id, "fetch_annotations: called");
        let rows: Vec<AnnotationRow> = self.read_table(ANNOTATIONS_FILE)?;
        Ok(rows.into_iter().find(|r| r.id == row_id).map(|r| r.data))
    }

    fn update_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()> {
        debug!(row_id, users = data.len(), "update_annotations: called");
        self.with_table::<AnnotationRow, _>(ANNOTATIONS_FILE, |rows| {
            let row = rows.iter_mut().find(|r| r.id == row_id).ok_or(StoreError::NotFound {
                table: "annotations",
                id: row_id,
            })?;
            row.data = data.clone();
            Ok(())
        })
    }

    fn upsert_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()> {
        debug!(row_id, users = data.len(), "upsert_annotations: called");
        self.with_table::<AnnotationRow, _>(ANNOTATIONS_FILE, |rows| {
            match rows.iter_mut().find(|r| r.id == row_id) {
                Some(row) => row.data = data.clone(),
                None => rows.push(AnnotationRow {
                    id: row_id,
                    data: data.clone(),
                }),
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AnnotationEntry;
    use tempfile::TempDir;

    #[test]
    fn test_catalog_from_json_and_yaml() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("reports.json"),
            r#"[{"id": 9, "title": "t", "creation_date": "2023-12-31", "description": "d"}]"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("users.yaml"),
            "- user_id: 1\n  name: Ana\n  interests: malware; phishing\n- user_id: 2\n  name: Bo\n",
        )
        .unwrap();

        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.reports().unwrap()[0].id, 9);

        let users = store.users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].field("interests"), Some("malware; phishing"));
        assert!(users[1].profile.is_empty());
    }

    #[test]
    fn test_missing_catalog_is_reported() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(matches!(store.reports(), Err(StoreError::MissingCollection(_))));
    }

    #[test]
    fn test_state_rows_by_fixed_id() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(store.fetch_cursor(1).unwrap().is_none());
        assert!(matches!(
            store.update_cursor(1, &CursorRecord::default()),
            Err(StoreError::NotFound { .. })
        ));

        store.upsert_cursor(1, &CursorRecord::default()).unwrap();
        store
            .upsert_cursor(
                2,
                &CursorRecord {
                    report_id: 5,
                    user_id: 1,
                    show_tutorial: false,
                },
            )
            .unwrap();

        let moved = CursorRecord {
            report_id: 1,
            user_id: 0,
            show_tutorial: false,
        };
        store.update_cursor(1, &moved).unwrap();
        assert_eq!(store.fetch_cursor(1).unwrap(), Some(moved));
        assert_eq!(store.fetch_cursor(2).unwrap().map(|r| r.report_id), Some(5));

        let raw = fs::read_to_string(temp.path().join(STATE_FILE)).unwrap();
        assert!(raw.contains("\"show_tutorial\""));
    }

    #[test]
    fn test_annotation_row_accepts_null_data() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(ANNOTATIONS_FILE), r#"[{"id": 1, "data": null}]"#).unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert_eq!(store.fetch_annotations(1).unwrap(), Some(AnnotationData::new()));
        assert_eq!(store.fetch_annotations(2).unwrap(), None);
    }

    #[test]
    fn test_annotations_update_overwrites() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.upsert_annotations(1, &AnnotationData::new()).unwrap();

        let data = AnnotationData::from([(
            3,
            AnnotationEntry {
                relevant_reports: vec![10, 11],
            },
        )]);
        store.update_annotations(1, &data).unwrap();
        assert_eq!(store.fetch_annotations(1).unwrap(), Some(data));
        assert!(!temp.path().join(format!("{}.tmp", ANNOTATIONS_FILE)).exists());
    }

    #[test]
    fn test_write_catalog_replaces_yaml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("users.yml"), "- user_id: 1\n  name: Old\n").unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let users = vec![User {
            user_id: 4,
            name: "New".to_string(),
            profile: Default::default(),
        }];
        store.write_catalog("users", &users).unwrap();
        assert!(!temp.path().join("users.yml").exists());
        assert_eq!(store.users().unwrap(), users);
    }
}
