use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info};

use super::Operation;
use crate::errors::AnalyticsError;
use crate::types::{CacheKeyString, FieldMap};

/// Canonical string encoding of an operation's full argument value.
///
/// Equal arguments must encode equally; map-like arguments encode with
/// sorted keys so insertion order does not split entries.
pub trait CacheKey {
    /// Encode `self` as a cache key.
    fn cache_key(&self) -> CacheKeyString;
}

macro_rules! display_cache_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CacheKey for $ty {
                fn cache_key(&self) -> CacheKeyString {
                    self.to_string()
                }
            }
        )*
    };
}

display_cache_key!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char
);

impl CacheKey for () {
    fn cache_key(&self) -> CacheKeyString {
        "()".into()
    }
}

impl CacheKey for str {
    fn cache_key(&self) -> CacheKeyString {
        format!("{self:?}")
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> CacheKeyString {
        self.as_str().cache_key()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for &T {
    fn cache_key(&self) -> CacheKeyString {
        (**self).cache_key()
    }
}

impl<T: CacheKey> CacheKey for Option<T> {
    fn cache_key(&self) -> CacheKeyString {
        match self {
            Some(value) => format!("Some({})", value.cache_key()),
            None => "None".into(),
        }
    }
}

impl<T: CacheKey> CacheKey for [T] {
    fn cache_key(&self) -> CacheKeyString {
        let parts: Vec<CacheKeyString> = self.iter().map(CacheKey::cache_key).collect();
        format!("[{}]", parts.join(","))
    }
}

impl<T: CacheKey> CacheKey for Vec<T> {
    fn cache_key(&self) -> CacheKeyString {
        self.as_slice().cache_key()
    }
}

impl<A: CacheKey, B: CacheKey> CacheKey for (A, B) {
    fn cache_key(&self) -> CacheKeyString {
        format!("({},{})", self.0.cache_key(), self.1.cache_key())
    }
}

impl<A: CacheKey, B: CacheKey, C: CacheKey> CacheKey for (A, B, C) {
    fn cache_key(&self) -> CacheKeyString {
        format!(
            "({},{},{})",
            self.0.cache_key(),
            self.1.cache_key(),
            self.2.cache_key()
        )
    }
}

impl CacheKey for Value {
    fn cache_key(&self) -> CacheKeyString {
        let mut out = String::new();
        write_canonical_json(self, &mut out);
        out
    }
}

impl CacheKey for FieldMap {
    fn cache_key(&self) -> CacheKeyString {
        let mut entries: Vec<(&String, &Value)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let mut out = String::from("{");
        for (idx, (key, value)) in entries.into_iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(&Value::from(key.as_str()).to_string());
            out.push(':');
            write_canonical_json(value, &mut out);
        }
        out.push('}');
        out
    }
}

fn write_canonical_json(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (key, nested)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical_json(nested, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical_json(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Stored result plus the instant it was produced.
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    /// The memoized result.
    pub value: V,
    /// When the result was stored.
    pub stored_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Valid while `now - stored_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Memoizes successful results per argument value for `ttl`.
///
/// State belongs to this instance only and lives as long as it does. There
/// is no size bound and no background sweep: a stale entry is replaced the
/// next time its key is requested. Failed calls are never stored.
pub struct Cache<O, V> {
    inner: O,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKeyString, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<O, V> Cache<O, V> {
    /// Wrap `inner`, reusing results for `ttl`. A zero TTL disables reuse.
    pub fn new(inner: O, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that invoked the wrapped operation.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache entries poisoned").len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored entry.
    pub fn clear(&self) {
        self.entries.lock().expect("cache entries poisoned").clear();
    }

    /// Borrow the wrapped operation.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<A, O, V> Operation<A> for Cache<O, V>
where
    A: CacheKey,
    O: Operation<A, Output = V>,
    V: Clone,
{
    type Output = V;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<V, AnalyticsError> {
        let key = args.cache_key();
        {
            let mut entries = self.entries.lock().expect("cache entries poisoned");
            if let Some(entry) = entries.get(&key) {
                if entry.is_fresh(self.ttl) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    info!(operation = self.inner.name(), "cache hit");
                    return Ok(entry.value.clone());
                }
                entries.remove(&key);
                debug!(operation = self.inner.name(), "cache entry expired");
            }
        }
        // Lock is released while the inner operation runs.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = self.inner.call(args)?;
        self.entries.lock().expect("cache entries poisoned").insert(
            key,
            CacheEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::FnOperation;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn identical_args_within_ttl_invoke_once() {
        let calls = AtomicUsize::new(0);
        let cache = Cache::new(
            FnOperation::new("double", |x: i64| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(x * 2)
            }),
            Duration::from_secs(5),
        );
        assert_eq!(cache.call(5).unwrap(), 10);
        assert_eq!(cache.call(5).unwrap(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);

        assert_eq!(cache.call(6).unwrap(), 12);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_recomputed() {
        let calls = AtomicUsize::new(0);
        let cache = Cache::new(
            FnOperation::new("count", |_: ()| Ok(calls.fetch_add(1, Ordering::SeqCst))),
            Duration::from_millis(30),
        );
        assert_eq!(cache.call(()).unwrap(), 0);
        assert_eq!(cache.call(()).unwrap(), 0);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.call(()).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_reuses() {
        let calls = AtomicUsize::new(0);
        let cache = Cache::new(
            FnOperation::new("count", |_: ()| Ok(calls.fetch_add(1, Ordering::SeqCst))),
            Duration::ZERO,
        );
        cache.call(()).unwrap();
        cache.call(()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let calls = AtomicUsize::new(0);
        let cache = Cache::new(
            FnOperation::new("flaky", |_: ()| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AnalyticsError::operation("flaky", "first call fails"))
                } else {
                    Ok("ok")
                }
            }),
            Duration::from_secs(60),
        );
        assert!(cache.call(()).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.call(()).unwrap(), "ok");
        assert_eq!(cache.call(()).unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn field_map_keys_ignore_insertion_order() {
        let mut a = FieldMap::new();
        a.insert("x".into(), Value::from(1));
        a.insert("y".into(), serde_json::json!({"b": 2, "a": 1}));
        let mut b = FieldMap::new();
        b.insert("y".into(), serde_json::json!({"a": 1, "b": 2}));
        b.insert("x".into(), Value::from(1));
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), r#"{"x":1,"y":{"a":1,"b":2}}"#);
    }

    #[test]
    fn composite_keys_distinguish_arguments() {
        assert_ne!((1u64, 2usize).cache_key(), (2u64, 1usize).cache_key());
        assert_ne!("5".cache_key(), 5u8.cache_key());
        assert_eq!(Some("a").cache_key(), "Some(\"a\")");
        assert_eq!(vec![1u8, 2].cache_key(), "[1,2]");
    }

    #[test]
    fn clear_forces_recompute() {
        let calls = AtomicUsize::new(0);
        let cache = Cache::new(
            FnOperation::new("count", |_: ()| Ok(calls.fetch_add(1, Ordering::SeqCst))),
            Duration::from_secs(60),
        );
        cache.call(()).unwrap();
        cache.clear();
        cache.call(()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.ttl(), Duration::from_secs(60));
        assert_eq!(cache.inner().name(), "count");
    }
}
