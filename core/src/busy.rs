//! Which todos have a request in flight.
//!
//! Single-item operations and batch operations are tracked in separate sets;
//! a key is busy if it is in either. Single markers are a set rather than one
//! slot so that concurrent operations on different todos never clear each
//! other's loader.

use std::collections::HashSet;

use crate::types::TodoId;

/// What a busy marker refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusyKey {
    PendingCreate,
    Todo(TodoId),
}

#[derive(Debug, Default, Clone)]
pub struct BusyTracker {
    single: HashSet<BusyKey>,
    bulk: HashSet<BusyKey>,
}

impl BusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a single key busy. Returns false, leaving the tracker unchanged,
    /// if the key is already busy.
    pub fn mark_busy(&mut self, key: BusyKey) -> bool {
        if self.is_busy_key(key) {
            return false;
        }
        self.single.insert(key)
    }

    /// Release a key from whichever set holds it.
    pub fn mark_idle(&mut self, key: BusyKey) {
        self.single.remove(&key);
        self.bulk.remove(&key);
    }

    /// Mark a batch busy. Ids that are already busy are skipped; the ids
    /// actually marked are returned in input order.
    pub fn mark_busy_many<I>(&mut self, ids: I) -> Vec<TodoId>
    where
        I: IntoIterator<Item = TodoId>,
    {
        let mut marked = Vec::new();
        for id in ids {
            let key = BusyKey::Todo(id);
            if !self.is_busy_key(key) && self.bulk.insert(key) {
                marked.push(id);
            }
        }
        marked
    }

    /// Drop every batch marker. Single-item markers are left alone. The
    /// controller releases batch members one by one; this is for a host that
    /// abandons a whole batch at once.
    pub fn clear_all(&mut self) {
        self.bulk.clear();
    }

    pub fn is_busy(&self, id: TodoId) -> bool {
        self.is_busy_key(BusyKey::Todo(id))
    }

    pub fn is_creating(&self) -> bool {
        self.is_busy_key(BusyKey::PendingCreate)
    }

    pub fn is_busy_key(&self, key: BusyKey) -> bool {
        self.single.contains(&key) || self.bulk.contains(&key)
    }

    pub fn is_idle(&self) -> bool {
        self.single.is_empty() && self.bulk.is_empty()
    }

    pub fn busy_ids(&self) -> Vec<TodoId> {
        let mut ids: Vec<TodoId> = self
            .single
            .iter()
            .chain(self.bulk.iter())
            .filter_map(|key| match key {
                BusyKey::Todo(id) => Some(*id),
                BusyKey::PendingCreate => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_marker_round_trip() {
        let mut busy = BusyTracker::new();
        assert!(busy.mark_busy(BusyKey::Todo(1)));
        assert!(busy.is_busy(1));
        assert!(!busy.is_busy(2));
        busy.mark_idle(BusyKey::Todo(1));
        assert!(!busy.is_busy(1));
        assert!(busy.is_idle());
    }

    #[test]
    fn second_mark_is_rejected() {
        let mut busy = BusyTracker::new();
        assert!(busy.mark_busy(BusyKey::Todo(1)));
        assert!(!busy.mark_busy(BusyKey::Todo(1)));
    }

    #[test]
    fn concurrent_singles_do_not_clobber() {
        let mut busy = BusyTracker::new();
        busy.mark_busy(BusyKey::Todo(1));
        busy.mark_busy(BusyKey::Todo(2));
        busy.mark_idle(BusyKey::Todo(1));
        assert!(busy.is_busy(2));
    }

    #[test]
    fn pending_create_is_not_a_todo_id() {
        let mut busy = BusyTracker::new();
        busy.mark_busy(BusyKey::PendingCreate);
        assert!(busy.is_creating());
        assert!(!busy.is_busy(0));
        assert!(busy.busy_ids().is_empty());
    }

    #[test]
    fn bulk_skips_ids_already_busy() {
        let mut busy = BusyTracker::new();
        busy.mark_busy(BusyKey::Todo(2));
        let marked = busy.mark_busy_many([1, 2, 3]);
        assert_eq!(marked, vec![1, 3]);
        assert_eq!(busy.busy_ids(), vec![1, 2, 3]);
        assert!(!busy.mark_busy(BusyKey::Todo(3)));
    }

    #[test]
    fn mark_idle_releases_bulk_members_one_by_one() {
        let mut busy = BusyTracker::new();
        busy.mark_busy_many([1, 2]);
        busy.mark_idle(BusyKey::Todo(1));
        assert!(!busy.is_busy(1));
        assert!(busy.is_busy(2));
    }

    #[test]
    fn clear_all_only_touches_bulk() {
        let mut busy = BusyTracker::new();
        busy.mark_busy(BusyKey::Todo(9));
        busy.mark_busy_many([1, 2]);
        busy.clear_all();
        assert_eq!(busy.busy_ids(), vec![9]);
    }
}
