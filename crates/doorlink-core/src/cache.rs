// ── Short-lived result cache ──
//
// Successful results of cacheable reads, keyed by operation, an argument
// discriminator and a coarse wall-clock bucket. Entries never expire on
// their own: once the bucket rolls over they simply stop matching, and
// the whole map is cleared when it reaches capacity.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::executor::Operation;

type CacheKey = (Operation, String, u64);

/// Concurrent map of type-erased results.
pub struct ResultCache {
    entries: DashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
    bucket_secs: u64,
    capacity: usize,
}

impl ResultCache {
    pub fn new(bucket: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            bucket_secs: bucket.as_secs().max(1),
            capacity: capacity.max(1),
        }
    }

    fn bucket(&self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        now / self.bucket_secs
    }

    /// Cached value for the current bucket. A type mismatch is a miss.
    pub fn get<T>(&self, operation: Operation, key: &str) -> Option<T>
    where
        T: Clone + 'static,
    {
        let entry = self
            .entries
            .get(&(operation, key.to_owned(), self.bucket()))?;
        let value = entry.value().downcast_ref::<T>().cloned();
        if value.is_some() {
            trace!(operation = %operation, key, "cache hit");
        }
        value
    }

    /// Store (or overwrite) the value for the current bucket.
    pub fn insert<T>(&self, operation: Operation, key: &str, value: T)
    where
        T: Send + Sync + 'static,
    {
        if self.entries.len() >= self.capacity {
            debug!(entries = self.entries.len(), "result cache full, clearing");
            self.entries.clear();
        }
        self.entries
            .insert((operation, key.to_owned(), self.bucket()), Arc::new(value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.len())
            .field("bucket_secs", &self.bucket_secs)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> ResultCache {
        // One bucket for the whole test run.
        ResultCache::new(Duration::from_secs(u64::MAX), capacity)
    }

    #[test]
    fn hit_returns_stored_value() {
        let cache = cache(10);
        cache.insert(Operation::ListDevices, "all", vec![1_u32, 2, 3]);
        assert_eq!(
            cache.get::<Vec<u32>>(Operation::ListDevices, "all"),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn keys_do_not_alias() {
        let cache = cache(10);
        cache.insert(Operation::ListDoors, "1", vec![10_u32]);
        cache.insert(Operation::ListDoors, "2", vec![20_u32]);
        assert_eq!(cache.get::<Vec<u32>>(Operation::ListDoors, "1"), Some(vec![10]));
        assert_eq!(cache.get::<Vec<u32>>(Operation::ListDevices, "1"), None);
    }

    #[test]
    fn type_mismatch_is_a_miss() {
        let cache = cache(10);
        cache.insert(Operation::ListDevices, "all", 7_u32);
        assert_eq!(cache.get::<String>(Operation::ListDevices, "all"), None);
    }

    #[test]
    fn overwrite_replaces_value() {
        let cache = cache(10);
        cache.insert(Operation::ListDevices, "all", 1_u32);
        cache.insert(Operation::ListDevices, "all", 2_u32);
        assert_eq!(cache.get::<u32>(Operation::ListDevices, "all"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reaching_capacity_clears_everything() {
        let cache = cache(2);
        cache.insert(Operation::ListDoors, "1", 1_u32);
        cache.insert(Operation::ListDoors, "2", 2_u32);
        cache.insert(Operation::ListDoors, "3", 3_u32);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u32>(Operation::ListDoors, "1"), None);
        assert_eq!(cache.get::<u32>(Operation::ListDoors, "3"), Some(3));
    }
}
