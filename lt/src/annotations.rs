//! Relevance annotations per user

use std::collections::{BTreeMap, BTreeSet};

use labelstore::{AnnotationData, AnnotationEntry, StateBackend, User};
use tracing::{debug, info, warn};

use crate::error::{LabelError, LabelResult};

/// Reports judged relevant, per user id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationMap {
    relevant: BTreeMap<i64, BTreeSet<i64>>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// One empty entry per known user
    pub fn scaffold(users: &[User]) -> Self {
        Self {
            relevant: users.iter().map(|u| (u.user_id, BTreeSet::new())).collect(),
        }
    }

    /// Record that `report_id` is relevant to `user_id`
    ///
    /// Re-marking an already recorded pair leaves the map unchanged. Returns
    /// whether the pair was new.
    pub fn mark_relevant(&mut self, user_id: i64, report_id: i64) -> bool {
        self.relevant.entry(user_id).or_default().insert(report_id)
    }

    pub fn relevant_reports(&self, user_id: i64) -> Option<&BTreeSet<i64>> {
        self.relevant.get(&user_id)
    }

    pub fn is_relevant(&self, user_id: i64, report_id: i64) -> bool {
        self.relevant.get(&user_id).is_some_and(|set| set.contains(&report_id))
    }

    pub fn user_count(&self) -> usize {
        self.relevant.len()
    }

    /// Total number of recorded (user, report) pairs
    pub fn judgment_count(&self) -> usize {
        self.relevant.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.relevant.is_empty()
    }

    /// Wire shape, report ids ascending
    pub fn to_data(&self) -> AnnotationData {
        self.relevant
            .iter()
            .map(|(user_id, set)| {
                (
                    *user_id,
                    AnnotationEntry {
                        relevant_reports: set.iter().copied().collect(),
                    },
                )
            })
            .collect()
    }
}

impl From<AnnotationData> for AnnotationMap {
    fn from(data: AnnotationData) -> Self {
        Self {
            relevant: data
                .into_iter()
                .map(|(user_id, entry)| (user_id, entry.relevant_reports.into_iter().collect()))
                .collect(),
        }
    }
}

/// Loads and saves the singleton annotation row
pub struct AnnotationStore<'a, B: StateBackend + ?Sized> {
    backend: &'a B,
    row_id: i64,
}

impl<'a, B: StateBackend + ?Sized> AnnotationStore<'a, B> {
    pub fn new(backend: &'a B, row_id: i64) -> Self {
        Self { backend, row_id }
    }

    /// Read the map, scaffolding an entry per user when the stored map is empty
    ///
    /// A missing row is an error; a present but empty one is not.
    pub fn load(&self, known_users: &[User]) -> LabelResult<AnnotationMap> {
        debug!(row_id = self.row_id, "AnnotationStore::load: called");
        let data = self
            .backend
            .fetch_annotations(self.row_id)?
            .ok_or_else(|| LabelError::Persistence(format!("annotation record {} not found", self.row_id)))?;
        if data.is_empty() {
            debug!(users = known_users.len(), "Annotation record empty, scaffolding");
            return Ok(AnnotationMap::scaffold(known_users));
        }
        Ok(AnnotationMap::from(data))
    }

    /// Overwrite the whole annotation row
    pub fn save(&self, map: &AnnotationMap) -> LabelResult<()> {
        debug!(row_id = self.row_id, users = map.user_count(), "AnnotationStore::save: called");
        self.backend
            .update_annotations(self.row_id, &map.to_data())
            .map_err(|e| {
                warn!(row_id = self.row_id, error = %e, "Failed to save annotations");
                LabelError::from(e)
            })?;
        info!(judgments = map.judgment_count(), "Saved annotations");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelstore::MemoryStore;
    use proptest::prelude::*;

    fn user(user_id: i64) -> User {
        User {
            user_id,
            name: format!("user-{}", user_id),
            profile: Default::default(),
        }
    }

    #[test]
    fn test_scaffold_when_stored_map_empty() {
        let store = MemoryStore::default();
        store.upsert_annotations(1, &AnnotationData::new()).unwrap();

        let map = AnnotationStore::new(&store, 1).load(&[user(4), user(9)]).unwrap();
        assert_eq!(map.user_count(), 2);
        assert_eq!(map.relevant_reports(4), Some(&BTreeSet::new()));
        assert_eq!(map.judgment_count(), 0);
    }

    #[test]
    fn test_missing_row_is_persistence_error() {
        let store = MemoryStore::default();
        let err = AnnotationStore::new(&store, 1).load(&[user(1)]).unwrap_err();
        assert!(matches!(err, LabelError::Persistence(_)));
    }

    #[test]
    fn test_stored_map_is_not_rescaffolded() {
        let store = MemoryStore::default();
        let data = AnnotationData::from([(
            4,
            AnnotationEntry {
                relevant_reports: vec![2, 2, 1],
            },
        )]);
        store.upsert_annotations(1, &data).unwrap();

        let map = AnnotationStore::new(&store, 1).load(&[user(4), user(9)]).unwrap();
        assert_eq!(map.user_count(), 1);
        assert_eq!(map.judgment_count(), 2);
        assert!(map.is_relevant(4, 1));
    }

    #[test]
    fn test_mark_relevant_creates_unknown_user() {
        let mut map = AnnotationMap::new();
        assert!(map.mark_relevant(5, 100));
        assert!(map.is_relevant(5, 100));
    }

    #[test]
    fn test_save_writes_sorted_ids() {
        let store = MemoryStore::default();
        store.upsert_annotations(1, &AnnotationData::new()).unwrap();
        let annotations = AnnotationStore::new(&store, 1);

        let mut map = AnnotationMap::scaffold(&[user(1)]);
        map.mark_relevant(1, 30);
        map.mark_relevant(1, 10);
        annotations.save(&map).unwrap();

        let stored = store.fetch_annotations(1).unwrap().unwrap();
        assert_eq!(stored[&1].relevant_reports, vec![10, 30]);
    }

    #[test]
    fn test_save_failure_keeps_previous_blob() {
        let store = MemoryStore::default();
        store.upsert_annotations(1, &AnnotationData::new()).unwrap();
        store.set_fail_writes(true);

        let mut map = AnnotationMap::new();
        map.mark_relevant(1, 1);
        assert!(AnnotationStore::new(&store, 1).save(&map).is_err());
        assert_eq!(store.fetch_annotations(1).unwrap(), Some(AnnotationData::new()));
    }

    proptest! {
        #[test]
        fn prop_mark_relevant_is_idempotent(
            seed in proptest::collection::btree_map(0i64..20, proptest::collection::vec(0i64..50, 0..10), 0..5),
            user_id in 0i64..20,
            report_id in 0i64..50,
        ) {
            let data: AnnotationData = seed
                .into_iter()
                .map(|(u, ids)| (u, AnnotationEntry { relevant_reports: ids }))
                .collect();
            let mut map = AnnotationMap::from(data);

            map.mark_relevant(user_id, report_id);
            let once = map.clone();
            let inserted_again = map.mark_relevant(user_id, report_id);

            prop_assert!(!inserted_again);
            prop_assert_eq!(&map, &once);
            let stored = &map.to_data()[&user_id].relevant_reports;
            prop_assert_eq!(stored.iter().filter(|id| **id == report_id).count(), 1);
        }
    }
}
