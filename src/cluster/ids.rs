//! Stock cluster-id generators.
//!
//! Counter-based generators hand out a fresh id per call regardless of the
//! members; [`content_hash`] derives the id from the member set instead.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use super::types::ClusterIdGenerator;

/// `0, 1, 2, ...` as `u64`.
pub fn sequential<I: 'static>() -> ClusterIdGenerator<I, u64> {
    let next = AtomicU64::new(0);
    Arc::new(move |_: &[I]| next.fetch_add(1, Ordering::Relaxed))
}

/// `0, 1, 2, ...` as `i32`.
pub fn sequential_i32<I: 'static>() -> ClusterIdGenerator<I, i32> {
    let next = AtomicI32::new(0);
    Arc::new(move |_: &[I]| next.fetch_add(1, Ordering::Relaxed))
}

/// `"{prefix}0", "{prefix}1", ...`.
pub fn prefixed<I: 'static>(prefix: impl Into<String>) -> ClusterIdGenerator<I, String> {
    let prefix = prefix.into();
    let next = AtomicU64::new(0);
    Arc::new(move |_: &[I]| format!("{}{}", prefix, next.fetch_add(1, Ordering::Relaxed)))
}

/// Hash of the sorted, deduplicated member ids.
///
/// Equal member sets map to equal ids, so a regrouping that reproduces an
/// earlier group also reproduces its id.
pub fn content_hash<I>() -> ClusterIdGenerator<I, u64>
where
    I: Hash + Ord + 'static,
{
    Arc::new(|ids: &[I]| {
        let mut sorted: Vec<&I> = ids.iter().collect();
        sorted.sort();
        sorted.dedup();
        let mut hasher = DefaultHasher::new();
        sorted.hash(&mut hasher);
        hasher.finish()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let ids = sequential::<u32>();
        assert_eq!(ids(&[1, 2]), 0);
        assert_eq!(ids(&[1, 2]), 1);

        let small = sequential_i32::<u32>();
        assert_eq!(small(&[]), 0);
        assert_eq!(small(&[]), 1);

        let named = prefixed::<u32>("cluster-");
        assert_eq!(named(&[5]), "cluster-0");
        assert_eq!(named(&[5]), "cluster-1");
    }

    #[test]
    fn content_hash_ignores_order() {
        let ids = content_hash::<&str>();
        assert_eq!(ids(&["a", "b", "c"]), ids(&["c", "a", "b"]));
        assert_eq!(ids(&["a", "b"]), ids(&["b", "a", "b"]));
        assert_ne!(ids(&["a", "b"]), ids(&["a", "c"]));
    }
}
