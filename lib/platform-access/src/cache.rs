//! Cache of query results shared by pages.
//!
//! Keys carry a scope so that everything derived from the signed-in user's
//! identity can be dropped at once when the session changes.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::debug;

/// Scope for reads keyed on the signed-in user.
pub const USER_SCOPE: &str = "user";

/// Identifies one cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope: String,
    parts: Vec<String>,
}

impl QueryKey {
    #[must_use]
    pub fn new<I, S>(scope: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: scope.into(),
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Key in the [`USER_SCOPE`].
    #[must_use]
    pub fn user<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(USER_SCOPE, parts)
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

/// Shared query result cache.
///
/// Cloning yields another handle to the same cache. Every invalidation bumps
/// a generation counter that views can watch to refetch.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, Value>>>,
    generation: Arc<watch::Sender<u64>>,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(generation),
        }
    }

    /// Returns the cached value for `key`.
    #[must_use]
    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Stores `value` under `key`.
    pub fn put(&self, key: QueryKey, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
    }

    /// Returns the cached value or loads and caches it.
    ///
    /// A result loaded across an invalidation is returned but not cached.
    pub async fn fetch<F, Fut, E>(&self, key: QueryKey, load: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let generation = self.generation();
        let value = load().await?;
        if self.generation() == generation {
            self.put(key, value.clone());
        }
        Ok(value)
    }

    /// Drops every entry in `scope`.
    pub fn invalidate_scope(&self, scope: &str) {
        let removed = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let before = entries.len();
            entries.retain(|key, _| key.scope != scope);
            before - entries.len()
        };
        debug!(scope, removed, "Invalidated cached queries");
        self.generation.send_modify(|generation| *generation += 1);
    }

    /// Drops every entry derived from the signed-in user's identity.
    pub fn invalidate_user(&self) {
        self.invalidate_scope(USER_SCOPE);
    }

    /// Returns the number of invalidations so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Watches the invalidation counter.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fetch_loads_once() {
        let cache = QueryCache::new();
        let loads = AtomicUsize::new(0);
        let key = QueryKey::user(["profile", "u1"]);

        for _ in 0..2 {
            let value = cache
                .fetch(key.clone(), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(json!({"full_name": "Ann"}))
                })
                .await
                .expect("load");
            assert_eq!(value["full_name"], "Ann");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = QueryCache::new();
        let key = QueryKey::new("invoices", ["all"]);
        let result = cache.fetch(key.clone(), || async { Err::<Value, _>("down") }).await;
        assert_eq!(result, Err("down"));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn invalidate_user_keeps_other_scopes() {
        let cache = QueryCache::new();
        let mut generation = cache.subscribe();
        cache.put(QueryKey::user(["profile"]), json!(1));
        cache.put(QueryKey::new("invoices", ["all"]), json!(2));

        cache.invalidate_user();

        assert!(cache.get(&QueryKey::user(["profile"])).is_none());
        assert_eq!(cache.get(&QueryKey::new("invoices", ["all"])), Some(json!(2)));
        assert_eq!(cache.generation(), 1);
        assert!(generation.has_changed().expect("sender alive"));
    }

    #[tokio::test]
    async fn subscribers_wake_on_invalidation() {
        let cache = QueryCache::new();
        let mut generations = cache.subscribe();

        cache.clone().invalidate_user();

        generations.changed().await.expect("cache alive");
        assert_eq!(*generations.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn load_across_invalidation_is_not_cached() {
        let cache = QueryCache::new();
        let key = QueryKey::user(["profile"]);
        let value = cache
            .fetch(key.clone(), || async {
                cache.invalidate_user();
                Ok::<_, ()>(json!("stale"))
            })
            .await
            .expect("load");
        assert_eq!(value, json!("stale"));
        assert!(cache.get(&key).is_none());
    }
}
