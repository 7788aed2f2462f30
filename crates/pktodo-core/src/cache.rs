use chrono::{DateTime, Utc};
use pktodo_shared::TodoRecord;
use tracing::{debug, trace};

/// Records of the active tab, newest first. Only ever a copy of what the
/// store returned or acknowledged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCache {
    records: Vec<TodoRecord>,
}

impl TaskCache {
    pub fn new(records: Vec<TodoRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TodoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&TodoRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn replace(&mut self, records: Vec<TodoRecord>) {
        debug!(before = self.records.len(), after = records.len(), "replacing task cache");
        self.records = records;
    }

    pub fn prepend(&mut self, record: TodoRecord) {
        trace!(id = record.id, "prepending record");
        self.records.insert(0, record);
    }

    /// Returns whether a record with `id` was present.
    pub fn set_done(&mut self, id: i64, done: bool) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.done = done;
                true
            }
            None => false,
        }
    }

    /// Returns whether a record with `id` was present.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        self.records.len() != before
    }

    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|record| !record.done).count()
    }

    pub fn overdue(&self, now: DateTime<Utc>) -> impl Iterator<Item = &TodoRecord> {
        self.records.iter().filter(move |record| record.is_overdue(now))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::testing::record;

    fn cache() -> TaskCache {
        TaskCache::new(vec![record(3, "c", None), record(2, "b", None), record(1, "a", None)])
    }

    fn ids(cache: &TaskCache) -> Vec<i64> {
        cache.records().iter().map(|record| record.id).collect()
    }

    #[test]
    fn remove_keeps_relative_order_of_the_rest() {
        let mut cache = cache();
        assert!(cache.remove(2));
        assert_eq!(ids(&cache), vec![3, 1]);
        assert!(!cache.remove(2));
        assert_eq!(ids(&cache), vec![3, 1]);
    }

    #[test]
    fn set_done_touches_only_the_matching_record() {
        let mut cache = cache();
        assert!(cache.set_done(2, true));
        assert!(cache.get(2).expect("record 2").done);
        assert!(!cache.get(1).expect("record 1").done);
        assert!(!cache.get(3).expect("record 3").done);
        assert!(!cache.set_done(99, true));
    }

    #[test]
    fn pending_count_tracks_done_flags() {
        let mut cache = cache();
        assert_eq!(cache.pending_count(), 3);
        cache.set_done(1, true);
        assert_eq!(cache.pending_count(), 2);
        cache.prepend(record(4, "d", None));
        assert_eq!(cache.pending_count(), 3);
        assert_eq!(ids(&cache), vec![4, 3, 2, 1]);
    }

    #[test]
    fn overdue_lists_only_open_past_due_records() {
        let now = Utc::now();
        let mut late = record(5, "late", None);
        late.due_at = Some(now - Duration::days(1));
        let mut late_done = record(6, "late but done", None);
        late_done.due_at = Some(now - Duration::days(1));
        late_done.done = true;

        let cache = TaskCache::new(vec![late, late_done, record(7, "no due", None)]);
        let overdue: Vec<i64> = cache.overdue(now).map(|record| record.id).collect();
        assert_eq!(overdue, vec![5]);
    }
}
