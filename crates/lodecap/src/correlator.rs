use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

/// A keyed map with single-retrieval semantics, pairing an in-flight request
/// with its eventually-produced response.
///
/// A worker [`put`]s a completed response under its request key; the polling
/// side checks [`contains`] and then [`take`]s the entry, which removes it.
/// A second `take` for the same key returns `None`: delivery is at most
/// once per key. `put` overwrites, so a retried request cannot leak a stale
/// response to a later poll.
///
/// Each instance carries its own lock. A correlator is meant to be scoped to
/// one session, so a worker completing a request and a poll thread reading a
/// response never contend with unrelated sessions.
///
/// [`put`]: Correlator::put
/// [`take`]: Correlator::take
/// [`contains`]: Correlator::contains
#[derive(Debug)]
pub struct Correlator<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Correlator<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty correlator.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores `value` under `key`, overwriting and returning any stale entry.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.entries.lock().insert(key, value)
    }

    /// Non-destructive membership check.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Removes and returns the entry under `key`.
    ///
    /// Returns `None` if the key is absent, including when it was already
    /// taken, which callers treat as "nothing to deliver", not an error.
    pub fn take(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key)
    }

    /// Number of responses awaiting retrieval.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no responses are awaiting retrieval.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K, V> Default for Correlator<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_removes_entry() {
        let correlator = Correlator::new();
        assert_eq!(correlator.put(1u32, "response"), None);

        assert!(correlator.contains(&1));
        assert_eq!(correlator.take(&1), Some("response"));

        // Second retrieval for the same key reports not-found.
        assert!(!correlator.contains(&1));
        assert_eq!(correlator.take(&1), None);
    }

    #[test]
    fn contains_is_non_destructive() {
        let correlator = Correlator::new();
        correlator.put(5u32, "r");
        assert!(correlator.contains(&5));
        assert!(correlator.contains(&5));
        assert_eq!(correlator.take(&5), Some("r"));
    }

    #[test]
    fn put_overwrites_stale_entry() {
        let correlator = Correlator::new();
        correlator.put(9u32, "stale");
        assert_eq!(correlator.put(9, "fresh"), Some("stale"));
        assert_eq!(correlator.take(&9), Some("fresh"));
    }

    #[test]
    fn keys_are_independent() {
        let correlator = Correlator::new();
        correlator.put(1u32, "a");
        correlator.put(2, "b");
        assert_eq!(correlator.take(&1), Some("a"));
        assert!(correlator.contains(&2));
        assert_eq!(correlator.len(), 1);
    }
}
