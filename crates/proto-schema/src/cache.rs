//! Memoization of parsed schemas and resolved message types.
//!
//! Entries are keyed by the schema identity (canonical file path or the
//! schema text itself) and, for message handles, the requested message name.
//! Each entry is populated at most once: the first caller runs the loader
//! while concurrent callers for the same key block on the entry's init lock,
//! then everyone observes the same published `Arc`. Reads after publication
//! go through `OnceLock::get` without taking a lock. A failed load removes
//! its entry once no other caller holds it, so a later call can retry and
//! lookups of names that never resolve do not accumulate.

use crate::{parser, Result, SchemaSource};
use proto_types::{DescriptorPool, MessageSchema, SchemaError};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, trace};

/// Identity of a schema source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaKey {
    Path {
        path: PathBuf,
        include_paths: Vec<PathBuf>,
    },
    Text(String),
}

impl SchemaKey {
    pub fn for_source(source: &SchemaSource) -> Result<Self> {
        match source {
            SchemaSource::File {
                path,
                include_paths,
            } => {
                let canonical = std::fs::canonicalize(path).map_err(|source| SchemaError::Io {
                    path: path.clone(),
                    source,
                })?;
                // roots that do not exist yet are keyed as given
                let include_paths = include_paths
                    .iter()
                    .map(|dir| std::fs::canonicalize(dir).unwrap_or_else(|_| dir.clone()))
                    .collect();
                Ok(SchemaKey::Path {
                    path: canonical,
                    include_paths,
                })
            }
            SchemaSource::Text { content, .. } => Ok(SchemaKey::Text(content.clone())),
        }
    }
}

struct Slot<T> {
    value: OnceLock<Arc<T>>,
    init: Mutex<()>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

impl<T> Slot<T> {
    fn get(&self) -> Option<Arc<T>> {
        self.value.get().cloned()
    }

    fn get_or_try_init(&self, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let value = Arc::new(load()?);
        Ok(Arc::clone(self.value.get_or_init(|| value)))
    }
}

struct SlotTable<K, T> {
    slots: Mutex<HashMap<K, Arc<Slot<T>>>>,
}

impl<K: Eq + Hash + Clone, T> SlotTable<K, T> {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &K) -> Option<Arc<T>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|slot| slot.get())
    }

    fn slot(&self, key: &K) -> Arc<Slot<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        let slot = Arc::new(Slot::default());
        slots.insert(key.clone(), Arc::clone(&slot));
        slot
    }

    /// Load through the slot for `key`, dropping the slot again if the load
    /// fails.
    fn get_or_try_init(&self, key: &K, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let slot = self.slot(key);
        let result = slot.get_or_try_init(load);
        if result.is_err() {
            self.evict_empty(key, slot);
        }
        result
    }

    /// Remove `slot` from the table if it is still the entry for `key`, is
    /// still empty, and nobody else holds it.
    fn evict_empty(&self, key: &K, slot: Arc<Slot<T>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = slots.get(key).is_some_and(|held| Arc::ptr_eq(held, &slot))
            && slot.value.get().is_none()
            // one reference in the table, one here
            && Arc::strong_count(&slot) == 2;
        if unused {
            slots.remove(key);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn populated(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|s| s.value.get().is_some()).count()
    }

    fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Cache of parsed descriptor pools and resolved message handles.
pub struct SchemaCache {
    pools: SlotTable<SchemaKey, DescriptorPool>,
    messages: SlotTable<(SchemaKey, String), MessageSchema>,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            pools: SlotTable::new(),
            messages: SlotTable::new(),
        }
    }

    /// Process-wide cache used by [`crate::load`].
    pub fn global() -> &'static SchemaCache {
        static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();
        GLOBAL.get_or_init(SchemaCache::new)
    }

    /// Load `message_name` from `source`, parsing the schema at most once.
    ///
    /// Repeated calls with the same inputs return the same `Arc`.
    pub fn load(&self, source: &SchemaSource, message_name: &str) -> Result<Arc<MessageSchema>> {
        let key = SchemaKey::for_source(source)?;
        let message_key = (key.clone(), message_name.to_string());

        if let Some(schema) = self.messages.get(&message_key) {
            trace!("Schema cache hit for {message_name}");
            return Ok(schema);
        }

        self.messages.get_or_try_init(&message_key, || {
            let pool = self.pool(&key, source)?;
            debug!("Resolving message type {message_name}");
            MessageSchema::new(pool, message_name)
        })
    }

    /// Parsed pool for `source`, shared by every message loaded from it.
    pub fn pool(&self, key: &SchemaKey, source: &SchemaSource) -> Result<Arc<DescriptorPool>> {
        self.pools.get_or_try_init(key, || match source {
            SchemaSource::File {
                path,
                include_paths,
            } => parser::parse_file_with_includes(path, include_paths),
            SchemaSource::Text { name, content } => parser::parse_str(content, Some(name.as_str())),
        })
    }

    /// Number of published message handles.
    pub fn len(&self) -> usize {
        self.messages.populated()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached entry. Handles already handed out stay valid.
    pub fn clear(&self) {
        self.messages.clear();
        self.pools.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const COUNTRY_PROTO: &str = r#"
        syntax = "proto3";
        package example.v1;

        message Country {
            string name = 1;
            int32 code = 2;
        }

        message CountryList {
            repeated Country countries = 1;
        }
    "#;

    fn text_source() -> SchemaSource {
        SchemaSource::text("example.proto", COUNTRY_PROTO)
    }

    #[test]
    fn test_repeated_load_returns_same_instance() {
        let cache = SchemaCache::new();
        let first = cache.load(&text_source(), "CountryList").unwrap();
        let second = cache.load(&text_source(), "CountryList").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_messages_share_one_parse() {
        let cache = SchemaCache::new();
        let list = cache.load(&text_source(), "CountryList").unwrap();
        let country = cache.load(&text_source(), "Country").unwrap();

        assert!(std::ptr::eq(list.pool(), country.pool()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unknown_message_is_not_cached() {
        let cache = SchemaCache::new();
        for i in 0..16 {
            let result = cache.load(&text_source(), &format!("DoesNotExist{i}"));
            assert!(matches!(result, Err(SchemaError::MessageNotFound(_))));
        }

        assert!(cache.is_empty());
        assert_eq!(cache.messages.slot_count(), 0);
        // the pool itself parsed fine and stays cached
        assert_eq!(cache.pools.slot_count(), 1);

        cache.load(&text_source(), "Country").unwrap();
        assert_eq!(cache.messages.slot_count(), 1);
    }

    #[test]
    fn test_failed_parse_is_not_cached() {
        let cache = SchemaCache::new();
        let broken = SchemaSource::text("broken.proto", "syntax = \"proto3\";\nmessage {");

        assert!(matches!(
            cache.load(&broken, "Anything"),
            Err(SchemaError::Parse(_))
        ));
        assert_eq!(cache.messages.slot_count(), 0);
        assert_eq!(cache.pools.slot_count(), 0);
    }

    #[test]
    fn test_file_source_keyed_by_canonical_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.proto");
        std::fs::write(&path, COUNTRY_PROTO).unwrap();

        let cache = SchemaCache::new();
        let direct = cache.load(&SchemaSource::file(&path), "Country").unwrap();
        let dotted = cache
            .load(
                &SchemaSource::file(dir.path().join(".").join("example.proto")),
                "Country",
            )
            .unwrap();

        assert!(Arc::ptr_eq(&direct, &dotted));
    }

    #[test]
    fn test_concurrent_first_load_publishes_one_instance() {
        let cache = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.load(&text_source(), "CountryList").unwrap())
            })
            .collect();

        let loaded: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for schema in &loaded[1..] {
            assert!(Arc::ptr_eq(&loaded[0], schema));
        }
    }

    #[test]
    fn test_slot_runs_loader_once() {
        let slot: Arc<Slot<usize>> = Arc::new(Slot::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    slot.get_or_try_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(42)
                    })
                    .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(*handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_retries_after_failure() {
        let slot: Slot<usize> = Slot::default();
        let failed = slot.get_or_try_init(|| Err(SchemaError::MessageNotFound("x".to_string())));
        assert!(failed.is_err());

        let value = slot.get_or_try_init(|| Ok(7)).unwrap();
        assert_eq!(*value, 7);
    }

    #[test]
    fn test_clear() {
        let cache = SchemaCache::new();
        let before = cache.load(&text_source(), "Country").unwrap();
        cache.clear();
        assert!(cache.is_empty());

        let after = cache.load(&text_source(), "Country").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.name(), after.name());
    }
}
