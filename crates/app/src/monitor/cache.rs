//! Value cache — last known value per zone or sensor.

use std::collections::BTreeMap;

/// Last known value per entity.
///
/// The monitor only keeps values for entities some live group references;
/// eviction is driven by the subscription index.
#[derive(Debug)]
pub(crate) struct ValueCache<K, V> {
    values: BTreeMap<K, V>,
}

impl<K, V> Default for ValueCache<K, V> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V: Clone> ValueCache<K, V> {
    pub(crate) fn from_values(values: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Store `value` unless `same` says the cached value already matches.
    ///
    /// Returns `true` when the cache changed.
    pub(crate) fn record(&mut self, key: K, value: V, same: impl Fn(&V, &V) -> bool) -> bool {
        if self.values.get(&key).is_some_and(|current| same(current, &value)) {
            return false;
        }
        self.values.insert(key, value);
        true
    }

    pub(crate) fn evict(&mut self, key: &K) -> Option<V> {
        self.values.remove(key)
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}
