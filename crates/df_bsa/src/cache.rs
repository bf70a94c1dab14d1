//! Lazily populated store for decoded records
//!

use bon::Builder;
use indexmap::IndexMap;
use std::{fmt::Debug, hash::Hash};
use tracing::debug;

/// Options controlling how a [`RecordCache`] keeps decoded records resident
#[derive(Debug, Clone, Copy, Builder)]
pub struct CacheOptions {
    /// Discard everything else in the collection whenever a new record is loaded
    #[builder(default = true)]
    pub auto_discard: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { auto_discard: true }
    }
}

/// Decoded records of one collection, loaded on first access.
///
/// With auto discard enabled at most one record stays resident: loading a new key drops every
/// other entry before the loader runs. A loader that fails leaves nothing behind.
///
/// ```
/// use df_bsa::{CacheOptions, RecordCache};
///
/// let mut cache: RecordCache<usize, String> = RecordCache::new(CacheOptions::default());
///
/// let value = cache.get_or_load(1, |k| Ok::<_, ()>(format!("record {k}"))).unwrap();
/// assert_eq!(value, "record 1");
///
/// cache.get_or_load(2, |k| Ok::<_, ()>(format!("record {k}"))).unwrap();
/// assert!(!cache.contains(&1));
/// ```
#[derive(Debug)]
pub struct RecordCache<K, V> {
    entries: IndexMap<K, V>,
    auto_discard: bool,
}

impl<K, V> Default for RecordCache<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            auto_discard: CacheOptions::default().auto_discard,
        }
    }
}

impl<K: Hash + Eq + Clone + Debug, V> RecordCache<K, V> {
    /// Create an empty cache
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: IndexMap::new(),
            auto_discard: options.auto_discard,
        }
    }

    /// Whether loading a new record drops the others
    pub fn auto_discard(&self) -> bool {
        self.auto_discard
    }

    /// Change the residency policy. Records already loaded are kept.
    pub fn set_auto_discard(&mut self, auto_discard: bool) {
        self.auto_discard = auto_discard;
    }

    /// Return the resident value for `key`, running `loader` if it is not resident yet.
    pub fn get_or_load<E>(
        &mut self,
        key: K,
        loader: impl FnOnce(&K) -> Result<V, E>,
    ) -> Result<&V, E> {
        if let Some(index) = self.entries.get_index_of(&key) {
            return Ok(&self.entries[index]);
        }

        if self.auto_discard && !self.entries.is_empty() {
            debug!(count = self.entries.len(), next = ?key, "auto discarding records");
            self.entries.clear();
        }

        let value = loader(&key)?;
        debug!(?key, "loaded record");

        let (index, _) = self.entries.insert_full(key, value);
        Ok(&self.entries[index])
    }

    /// The resident value for `key`, without loading
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Whether `key` is resident
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop the value for `key`, returning it if it was resident
    pub fn discard(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.shift_remove(key);
        if removed.is_some() {
            debug!(?key, "discarded record");
        }
        removed
    }

    /// Drop every resident value
    pub fn discard_all(&mut self) {
        self.entries.clear();
    }

    /// Number of resident values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is resident
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resident keys in load order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::cache::{CacheOptions, RecordCache};

    fn load(counter: &Cell<usize>) -> impl Fn(&&'static str) -> Result<String, String> + '_ {
        move |key| {
            counter.set(counter.get() + 1);
            Ok(key.to_lowercase())
        }
    }

    #[traced_test]
    #[test]
    fn auto_discard_evicts_previous_record() {
        let loads = Cell::new(0);
        let mut cache = RecordCache::new(CacheOptions::builder().auto_discard(true).build());

        assert_eq!(cache.get_or_load("A", load(&loads)).unwrap(), "a");
        assert_eq!(cache.get_or_load("A", load(&loads)).unwrap(), "a");
        assert_eq!(loads.get(), 1);

        cache.get_or_load("B", load(&loads)).unwrap();
        assert!(!cache.contains(&"A"));
        assert!(cache.contains(&"B"));
        assert_eq!(cache.len(), 1);

        cache.get_or_load("A", load(&loads)).unwrap();
        assert_eq!(loads.get(), 3);
    }

    #[traced_test]
    #[test]
    fn disabled_auto_discard_keeps_records() {
        let loads = Cell::new(0);
        let mut cache = RecordCache::new(CacheOptions::builder().auto_discard(false).build());

        cache.get_or_load("A", load(&loads)).unwrap();
        cache.get_or_load("B", load(&loads)).unwrap();
        cache.get_or_load("A", load(&loads)).unwrap();

        assert_eq!(loads.get(), 2);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn explicit_discard_works_with_either_policy() {
        let loads = Cell::new(0);
        let mut cache = RecordCache::new(CacheOptions::builder().auto_discard(false).build());

        cache.get_or_load("A", load(&loads)).unwrap();
        cache.get_or_load("B", load(&loads)).unwrap();

        assert_eq!(cache.discard(&"A"), Some("a".to_string()));
        assert_eq!(cache.discard(&"A"), None);
        assert_eq!(cache.len(), 1);

        cache.set_auto_discard(true);
        cache.discard_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_loads_leave_nothing_behind() {
        let mut cache: RecordCache<u32, u32> = RecordCache::new(CacheOptions::default());

        cache.get_or_load(1, |_| Ok::<_, &str>(10)).unwrap();
        let result = cache.get_or_load(2, |_| Err("corrupt"));

        assert_eq!(result, Err("corrupt"));
        assert!(!cache.contains(&2));
        assert!(cache.is_empty());
    }

    #[test]
    fn default_options_enable_auto_discard() {
        assert!(CacheOptions::default().auto_discard);
        assert!(CacheOptions::builder().build().auto_discard);
    }
}
