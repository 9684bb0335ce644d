//! Solids and the per-particle set of occupied solids.

use std::cmp::Reverse;

use smallvec::SmallVec;

use crate::id::SolidId;

/// A bounded material region.
///
/// `priority` decides which of several overlapping solids governs the
/// material a particle sees: the highest-priority non-ignored solid in
/// the particle's [`SolidSet`] is its current solid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solid {
    /// Stable identity within the geometry.
    pub id: SolidId,
    /// Human-readable name used in diagnostics.
    pub name: String,
    /// Priority; larger values win.
    pub priority: u32,
}

impl Solid {
    /// Create a new solid.
    pub fn new(id: SolidId, name: impl Into<String>, priority: u32) -> Self {
        Self {
            id,
            name: name.into(),
            priority,
        }
    }
}

/// One occupied solid inside a [`SolidSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidEntry {
    /// The occupied solid.
    pub id: SolidId,
    /// The solid's priority, copied from the geometry's priority table.
    pub priority: u32,
    /// Whether the solid is physically ignored at the time it was entered.
    pub ignored: bool,
}

/// Every solid a particle currently occupies.
///
/// Entries are kept sorted by descending priority (ties by ascending
/// id), so the current solid is the first non-ignored entry. A solid is
/// in the set iff the particle's last verified position lies inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolidSet {
    entries: SmallVec<[SolidEntry; 4]>,
}

impl SolidSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping priority order.
    pub fn insert(&mut self, entry: SolidEntry) {
        self.remove(entry.id);
        let key = (entry.priority, Reverse(entry.id));
        let pos = self
            .entries
            .iter()
            .position(|e| (e.priority, Reverse(e.id)) < key)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Remove a solid. Returns `true` if it was present.
    pub fn remove(&mut self, id: SolidId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Whether the solid is in the set.
    pub fn contains(&self, id: SolidId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Look up the entry for a solid.
    pub fn get(&self, id: SolidId) -> Option<&SolidEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The highest-priority non-ignored entry.
    pub fn current(&self) -> Option<&SolidEntry> {
        self.entries.iter().find(|e| !e.ignored)
    }

    /// Entries in descending priority order.
    pub fn iter(&self) -> impl Iterator<Item = &SolidEntry> {
        self.entries.iter()
    }

    /// Number of occupied solids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no solid is occupied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SolidEntry> for SolidSet {
    fn from_iter<I: IntoIterator<Item = SolidEntry>>(iter: I) -> Self {
        let mut set = SolidSet::new();
        for e in iter {
            set.insert(e);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(id: u32, priority: u32, ignored: bool) -> SolidEntry {
        SolidEntry {
            id: SolidId(id),
            priority,
            ignored,
        }
    }

    #[test]
    fn current_skips_ignored() {
        let set: SolidSet = [entry(0, 0, false), entry(1, 5, true), entry(2, 3, false)]
            .into_iter()
            .collect();
        assert_eq!(set.current().map(|e| e.id), Some(SolidId(2)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn insert_replaces_existing() {
        let mut set = SolidSet::new();
        set.insert(entry(1, 2, false));
        set.insert(entry(1, 2, true));
        assert_eq!(set.len(), 1);
        assert!(set.get(SolidId(1)).unwrap().ignored);
    }

    #[test]
    fn remove_reports_presence() {
        let mut set: SolidSet = [entry(0, 0, false)].into_iter().collect();
        assert!(!set.remove(SolidId(7)));
        assert!(set.remove(SolidId(0)));
        assert!(set.is_empty());
        assert!(set.current().is_none());
    }

    #[test]
    fn equal_priorities_order_by_id() {
        let set: SolidSet = [entry(4, 1, false), entry(2, 1, false)].into_iter().collect();
        assert_eq!(set.current().map(|e| e.id), Some(SolidId(2)));
    }

    fn arb_entries() -> impl Strategy<Value = Vec<(u32, u32, bool)>> {
        prop::collection::vec((0u32..16, 0u32..8, any::<bool>()), 0..12)
    }

    proptest! {
        #[test]
        fn entries_sorted_by_priority(raw in arb_entries()) {
            let set: SolidSet = raw.iter().map(|&(i, p, ig)| entry(i, p, ig)).collect();
            let prios: Vec<u32> = set.iter().map(|e| e.priority).collect();
            prop_assert!(prios.windows(2).all(|w| w[0] >= w[1]));
        }

        #[test]
        fn current_is_max_priority_non_ignored(raw in arb_entries()) {
            let set: SolidSet = raw.iter().map(|&(i, p, ig)| entry(i, p, ig)).collect();
            let best = set.iter().filter(|e| !e.ignored).map(|e| e.priority).max();
            prop_assert_eq!(set.current().map(|e| e.priority), best);
        }
    }
}
