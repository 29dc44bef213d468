use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Mutex;

pub type SharedResolution<T> = Shared<BoxFuture<'static, T>>;

/// Bounded, process-lifetime map from raw place name to the shared future
/// of its resolution. Storing the future rather than the finished value
/// guarantees at most one in-flight external resolution per distinct name:
/// concurrent callers attach to the same pending result.
///
/// Eviction is clear-on-full. The persistent cache is the durable backstop,
/// so dropping the whole map on capacity is acceptable and keeps this free
/// of per-entry bookkeeping.
pub struct ResolutionCache<T> {
    capacity: usize,
    entries: Mutex<HashMap<String, SharedResolution<T>>>,
}

impl<T: Clone> ResolutionCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached resolution for `name`, creating and caching it
    /// from `make` when absent. The flag is true when `make` ran, i.e. this
    /// call started a fresh resolution instead of attaching to an existing
    /// one. The lock is never held across an await.
    pub fn get_or_insert_with<F>(&self, name: &str, make: F) -> (SharedResolution<T>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(name) {
            return (existing.clone(), false);
        }
        if entries.len() >= self.capacity {
            println!(
                "Resolution cache reached capacity ({}), clearing",
                self.capacity
            );
            entries.clear();
        }
        let shared = make().shared();
        entries.insert(name.to_string(), shared.clone());
        (shared, true)
    }

    /// Drops a single entry. Used to evict unresolved fallbacks so the next
    /// request retries the external lookup.
    pub fn remove(&self, name: &str) {
        self.entries.lock().unwrap().remove(name);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
