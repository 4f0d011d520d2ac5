use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::id::ChannelId;

/// Channel-isolated key/value store for connector records.
///
/// Repositories for remote mappings (listings, category ids, gateways) sit on
/// top of this; a record is only ever visible through the channel it belongs to.
pub trait ChannelStore<K, V>: Send + Sync {
    fn get(&self, channel_id: ChannelId, key: &K) -> Option<V>;
    fn upsert(&self, channel_id: ChannelId, key: K, value: V);
    /// All records of a channel, in no particular order.
    fn list(&self, channel_id: ChannelId) -> Vec<V>;
    /// First record of the channel matching `predicate`.
    fn find(&self, channel_id: ChannelId, predicate: &dyn Fn(&V) -> bool) -> Option<V>;
    /// Records of every channel.
    fn all(&self) -> Vec<V>;
    /// Store `value` unless a record of the channel matches `conflicts`.
    ///
    /// The check and the write are one atomic step. Returns whether the value
    /// was stored.
    fn insert_unless(
        &self,
        channel_id: ChannelId,
        key: K,
        value: V,
        conflicts: &dyn Fn(&V) -> bool,
    ) -> bool;
}

impl<K, V, S> ChannelStore<K, V> for Arc<S>
where
    S: ChannelStore<K, V> + ?Sized,
{
    fn get(&self, channel_id: ChannelId, key: &K) -> Option<V> {
        (**self).get(channel_id, key)
    }

    fn upsert(&self, channel_id: ChannelId, key: K, value: V) {
        (**self).upsert(channel_id, key, value)
    }

    fn list(&self, channel_id: ChannelId) -> Vec<V> {
        (**self).list(channel_id)
    }

    fn find(&self, channel_id: ChannelId, predicate: &dyn Fn(&V) -> bool) -> Option<V> {
        (**self).find(channel_id, predicate)
    }

    fn all(&self) -> Vec<V> {
        (**self).all()
    }

    fn insert_unless(
        &self,
        channel_id: ChannelId,
        key: K,
        value: V,
        conflicts: &dyn Fn(&V) -> bool,
    ) -> bool {
        (**self).insert_unless(channel_id, key, value, conflicts)
    }
}

/// In-memory channel-isolated store for tests/dev.
#[derive(Debug)]
pub struct InMemoryChannelStore<K, V> {
    inner: RwLock<HashMap<(ChannelId, K), V>>,
}

impl<K, V> InMemoryChannelStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryChannelStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// A panic while holding the lock cannot leave a map entry half-written, so a
// poisoned lock is recovered rather than dropping reads or writes.
impl<K, V> InMemoryChannelStore<K, V> {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<(ChannelId, K), V>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<(ChannelId, K), V>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K, V> ChannelStore<K, V> for InMemoryChannelStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, channel_id: ChannelId, key: &K) -> Option<V> {
        self.read().get(&(channel_id, key.clone())).cloned()
    }

    fn upsert(&self, channel_id: ChannelId, key: K, value: V) {
        self.write().insert((channel_id, key), value);
    }

    fn list(&self, channel_id: ChannelId) -> Vec<V> {
        self.read()
            .iter()
            .filter_map(|((c, _k), v)| if *c == channel_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn find(&self, channel_id: ChannelId, predicate: &dyn Fn(&V) -> bool) -> Option<V> {
        self.read()
            .iter()
            .find(|((c, _k), v)| *c == channel_id && predicate(v))
            .map(|(_, v)| v.clone())
    }

    fn all(&self) -> Vec<V> {
        self.read().values().cloned().collect()
    }

    fn insert_unless(
        &self,
        channel_id: ChannelId,
        key: K,
        value: V,
        conflicts: &dyn Fn(&V) -> bool,
    ) -> bool {
        let mut map = self.write();
        if map
            .iter()
            .any(|((c, _k), v)| *c == channel_id && conflicts(v))
        {
            return false;
        }
        map.insert((channel_id, key), value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_isolated_per_channel() {
        let store: InMemoryChannelStore<u32, &'static str> = InMemoryChannelStore::new();
        let a = ChannelId::new();
        let b = ChannelId::new();

        store.upsert(a, 1, "first");
        store.upsert(b, 1, "other");

        assert_eq!(store.get(a, &1), Some("first"));
        assert_eq!(store.get(b, &1), Some("other"));
        assert_eq!(store.list(a), vec!["first"]);
        assert_eq!(store.find(b, &|v| v.starts_with('o')), Some("other"));
        assert_eq!(store.find(a, &|v| v.starts_with('o')), None);

        let mut all = store.all();
        all.sort();
        assert_eq!(all, vec!["first", "other"]);
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let store: InMemoryChannelStore<u32, i64> = InMemoryChannelStore::new();
        let channel = ChannelId::new();
        store.upsert(channel, 7, 1);
        store.upsert(channel, 7, 2);
        assert_eq!(store.list(channel), vec![2]);
    }

    #[test]
    fn insert_unless_checks_only_the_channel() {
        let store: InMemoryChannelStore<u32, &'static str> = InMemoryChannelStore::new();
        let a = ChannelId::new();
        let b = ChannelId::new();

        assert!(store.insert_unless(a, 1, "sku", &|v| *v == "sku"));
        assert!(!store.insert_unless(a, 2, "sku", &|v| *v == "sku"));
        assert!(store.insert_unless(b, 2, "sku", &|v| *v == "sku"));
        assert_eq!(store.list(a), vec!["sku"]);
    }

    #[test]
    fn writes_survive_a_poisoned_lock() {
        let shared: Arc<InMemoryChannelStore<u32, i64>> = Arc::new(InMemoryChannelStore::new());
        let channel = ChannelId::new();
        let poisoner = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        let store: &InMemoryChannelStore<u32, i64> = &shared;
        assert!(store.inner.is_poisoned());

        store.upsert(channel, 1, 10);
        assert_eq!(store.get(channel, &1), Some(10));
        assert!(store.insert_unless(channel, 2, 20, &|v| *v == 20));
        assert_eq!(store.all().len(), 2);
    }
}
