//! Subscription index — reverse lookup from an entity to the groups that
//! reference it.

use std::collections::{BTreeMap, BTreeSet};

use zonehub_domain::id::MonitorId;

/// Maps an entity ID to the set of monitor groups listing it.
///
/// An entity appears in the index iff at least one live group lists it.
/// Group sets are ordered, so fan-out visits groups by ascending ID.
#[derive(Debug)]
pub(crate) struct SubscriptionIndex<K> {
    entries: BTreeMap<K, BTreeSet<MonitorId>>,
}

impl<K> Default for SubscriptionIndex<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> SubscriptionIndex<K> {
    /// Record that `group` references `key`.
    pub(crate) fn insert(&mut self, key: K, group: MonitorId) {
        self.entries.entry(key).or_default().insert(group);
    }

    /// Forget that `group` references `key`.
    ///
    /// Returns `true` when this was the last group referencing `key`, in
    /// which case the entry is gone.
    pub(crate) fn remove(&mut self, key: &K, group: MonitorId) -> bool {
        let Some(groups) = self.entries.get_mut(key) else {
            return false;
        };
        if !groups.remove(&group) {
            return false;
        }
        if groups.is_empty() {
            self.entries.remove(key);
            return true;
        }
        false
    }

    /// Groups referencing `key`, if any.
    pub(crate) fn groups(&self, key: &K) -> Option<&BTreeSet<MonitorId>> {
        self.entries.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonehub_domain::id::ZoneId;

    fn id(raw: u64) -> MonitorId {
        MonitorId::from_raw(raw)
    }

    #[test]
    fn should_list_groups_in_ascending_order() {
        let mut index = SubscriptionIndex::default();
        let zone = ZoneId::from("z1");
        index.insert(zone.clone(), id(10));
        index.insert(zone.clone(), id(2));
        index.insert(zone.clone(), id(9));

        let groups: Vec<_> = index.groups(&zone).unwrap().iter().copied().collect();
        assert_eq!(groups, vec![id(2), id(9), id(10)]);
    }

    #[test]
    fn should_drop_entry_when_last_group_removed() {
        let mut index = SubscriptionIndex::default();
        let zone = ZoneId::from("z1");
        index.insert(zone.clone(), id(1));
        index.insert(zone.clone(), id(2));

        assert!(!index.remove(&zone, id(1)));
        assert!(index.groups(&zone).is_some());
        assert!(index.remove(&zone, id(2)));
        assert!(index.groups(&zone).is_none());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn should_ignore_removal_of_unknown_pair() {
        let mut index = SubscriptionIndex::default();
        let zone = ZoneId::from("z1");
        index.insert(zone.clone(), id(1));

        assert!(!index.remove(&zone, id(7)));
        assert!(!index.remove(&ZoneId::from("other"), id(1)));
        assert!(index.groups(&zone).is_some());
    }
}
