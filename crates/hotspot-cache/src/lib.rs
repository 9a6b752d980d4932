use dashmap::DashMap;

/// A cached analytics response alongside the header value clients should
/// see when it is served from cache.
#[derive(Clone)]
struct CacheEntry {
    value: serde_json::Value,
}

/// In-process, string-keyed cache fronting analytics queries.
///
/// Entries are immutable once inserted (replace-only on `put`), so
/// concurrent readers never observe a torn value. There is no TTL: entries
/// live until explicitly invalidated, which the scheduler does on
/// successful ingestion.
#[derive(Default)]
pub struct Cache {
    entries: DashMap<String, CacheEntry>,
}

impl Cache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn put(&self, key: String, value: serde_json::Value) {
        self.entries.insert(key, CacheEntry { value });
    }

    /// Remove every entry whose key begins with `prefix`. Used to drop all
    /// cached analytics for one project after a successful ingestion.
    pub fn invalidate(&self, prefix: &str) {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(prefix, removed, "invalidated cache entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical key construction: query kind, project id, then the normalized
/// filter fingerprint, in that fixed order.
pub fn cache_key(query_kind: &str, project_id: i64, fingerprint: &str) -> String {
    format!("{project_id}:{query_kind}:{fingerprint}")
}

/// The prefix that covers every cache entry for a given project, regardless
/// of query kind or fingerprint.
pub fn project_prefix(project_id: i64) -> String {
    format!("{project_id}:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let cache = Cache::new();
        let key = cache_key("hotspots", 1, "page=1");
        cache.put(key.clone(), serde_json::json!({"a": 1}));
        assert_eq!(cache.get(&key), Some(serde_json::json!({"a": 1})));
    }

    #[test]
    fn get_missing_is_none() {
        let cache = Cache::new();
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn invalidate_drops_only_matching_prefix() {
        let cache = Cache::new();
        cache.put(cache_key("hotspots", 1, "a"), serde_json::json!(1));
        cache.put(cache_key("stats", 1, "b"), serde_json::json!(2));
        cache.put(cache_key("hotspots", 2, "a"), serde_json::json!(3));

        cache.invalidate(&project_prefix(1));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&cache_key("hotspots", 2, "a")).is_some());
    }

    #[test]
    fn put_replaces_existing_entry() {
        let cache = Cache::new();
        let key = cache_key("stats", 1, "");
        cache.put(key.clone(), serde_json::json!(1));
        cache.put(key.clone(), serde_json::json!(2));
        assert_eq!(cache.get(&key), Some(serde_json::json!(2)));
    }
}
