// Keyed cache of enriched squads.
//
// Entries are whole snapshots keyed by (manager, gameweek). They are never
// patched in place: a refresh replaces the entry wholesale.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::gameweek::Gameweek;
use crate::squad::{EnrichedSquad, ManagerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub manager_id: ManagerId,
    pub gameweek: Gameweek,
}

impl SnapshotKey {
    pub fn new(manager_id: ManagerId, gameweek: Gameweek) -> Self {
        SnapshotKey {
            manager_id,
            gameweek,
        }
    }

    pub fn of(squad: &EnrichedSquad) -> Self {
        SnapshotKey::new(squad.manager_id, squad.gameweek)
    }
}

/// Bounded snapshot cache with insertion-order eviction.
#[derive(Debug)]
pub struct SnapshotCache {
    capacity: usize,
    entries: HashMap<SnapshotKey, Arc<EnrichedSquad>>,
    /// Keys from oldest to newest insertion.
    order: VecDeque<SnapshotKey>,
}

impl SnapshotCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SnapshotCache {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &SnapshotKey) -> Option<Arc<EnrichedSquad>> {
        self.entries.get(key).cloned()
    }

    /// Store a squad under its own key, replacing any previous entry and
    /// evicting the oldest entry when full.
    pub fn insert(&mut self, squad: Arc<EnrichedSquad>) {
        let key = SnapshotKey::of(&squad);
        if self.entries.insert(key, squad).is_some() {
            self.order.retain(|k| *k != key);
        }
        self.order.push_back(key);

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn remove(&mut self, key: &SnapshotKey) -> Option<Arc<EnrichedSquad>> {
        self.order.retain(|k| k != key);
        self.entries.remove(key)
    }

    /// Drop every entry not belonging to one of `managers`.
    pub fn retain_managers(&mut self, managers: &[ManagerId]) {
        self.entries.retain(|k, _| managers.contains(&k.manager_id));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
