use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicU64, Ordering};

use prova_core::Checksum;

use crate::outcome::VerificationResult;

/// How urgently an implementation needs verifying, as judged by the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CachePriority {
    /// Never seen before.
    Unverified,
    /// Seen before under a different checksum.
    Modified,
    /// Same body, but something it depends on changed.
    DependenciesChanged,
    /// Cached result is current.
    Skip,
}

impl CachePriority {
    pub fn value(self) -> i64 {
        match self {
            CachePriority::Unverified => 1,
            CachePriority::Modified => 2,
            CachePriority::DependenciesChanged => 3,
            CachePriority::Skip => i64::MAX,
        }
    }

    pub fn needs_verification(self) -> bool {
        self != CachePriority::Skip
    }
}

/// What the cache needs to know about an implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplementationFingerprint {
    /// Stable identity across program snapshots (the implementation's name).
    pub id: String,
    pub checksum: Option<Checksum>,
    pub dependency_checksum: Option<Checksum>,
}

impl ImplementationFingerprint {
    pub fn new(
        id: impl Into<String>,
        checksum: Option<Checksum>,
        dependency_checksum: Option<Checksum>,
    ) -> Self {
        Self {
            id: id.into(),
            checksum,
            dependency_checksum,
        }
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    identity: String,
    result: VerificationResult,
}

/// Verification results from earlier runs, keyed by implementation checksum.
///
/// Shared between concurrent units; lookups never mutate stored results and
/// inserts overwrite the entry for their checksum.
#[derive(Debug, Default)]
pub struct VerificationResultCache {
    entries: RwLock<HashMap<Checksum, CacheEntry>>,
    last_checksum: RwLock<HashMap<String, Checksum>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl VerificationResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `imp` and returns the reusable result on a skip.
    pub fn lookup(
        &self,
        imp: &ImplementationFingerprint,
    ) -> (Option<VerificationResult>, CachePriority) {
        self.lookup_if(imp, |_| true)
    }

    /// Like [`Self::lookup`], but a current result rejected by `accept` is not
    /// returned and counts as a miss. The priority is still [`CachePriority::Skip`].
    pub fn lookup_if(
        &self,
        imp: &ImplementationFingerprint,
        accept: impl FnOnce(&VerificationResult) -> bool,
    ) -> (Option<VerificationResult>, CachePriority) {
        let Some(checksum) = imp.checksum else {
            return (None, CachePriority::Unverified);
        };

        let entry = read(&self.entries)
            .get(&checksum)
            .cloned()
            .filter(|e| e.identity == imp.id);

        let Some(entry) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return (None, self.unmatched_priority(imp));
        };

        let deps_current = matches!(
            (entry.result.dependency_checksum, imp.dependency_checksum),
            (Some(stored), Some(current)) if stored == current
        );
        if !deps_current {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return (None, CachePriority::DependenciesChanged);
        }

        if !accept(&entry.result) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return (None, CachePriority::Skip);
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        let mut result = entry.result;
        result.was_cached = true;
        (Some(result), CachePriority::Skip)
    }

    /// Classification only; does not count as a hit or miss.
    pub fn priority(&self, imp: &ImplementationFingerprint) -> CachePriority {
        let Some(checksum) = imp.checksum else {
            return CachePriority::Unverified;
        };
        let entries = read(&self.entries);
        match entries.get(&checksum).filter(|e| e.identity == imp.id) {
            None => self.unmatched_priority(imp),
            Some(e) => match (e.result.dependency_checksum, imp.dependency_checksum) {
                (Some(stored), Some(current)) if stored == current => CachePriority::Skip,
                _ => CachePriority::DependenciesChanged,
            },
        }
    }

    /// Stores `result` under the implementation's checksum. Implementations
    /// without a checksum are never cached.
    pub fn insert(&self, imp: &ImplementationFingerprint, result: VerificationResult) {
        let Some(checksum) = imp.checksum else {
            return;
        };
        let mut result = result;
        result.checksum = Some(checksum);
        result.dependency_checksum = imp.dependency_checksum;
        result.was_cached = false;
        write(&self.entries).insert(
            checksum,
            CacheEntry {
                identity: imp.id.clone(),
                result,
            },
        );
        write(&self.last_checksum).insert(imp.id.clone(), checksum);
    }

    pub fn clear(&self) {
        write(&self.entries).clear();
        write(&self.last_checksum).clear();
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn unmatched_priority(&self, imp: &ImplementationFingerprint) -> CachePriority {
        let seen = read(&self.last_checksum).contains_key(&imp.id);
        if seen {
            CachePriority::Modified
        } else {
            CachePriority::Unverified
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
