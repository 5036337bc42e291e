use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

/// A read-mostly map whose entries are computed once and never replaced.
///
/// Values are computed without holding the lock. When two threads race on the same key the
/// first insert wins and the loser's value is dropped, so every caller observes the same
/// value. Errors are returned to the caller and not cached.
#[derive(Debug)]
pub(crate) struct OnceMap<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    pub(crate) fn get_or_try_compute<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let computed = compute()?;

        let mut entries = self.entries.write();
        let mut lost_race = true;
        let value = entries
            .entry(key.clone())
            .or_insert_with(|| {
                lost_race = false;
                computed
            })
            .clone();
        drop(entries);

        if lost_race {
            tracing::trace!(target: "nova.overload", key = ?key, "cache entry populated concurrently");
        }
        Ok(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
