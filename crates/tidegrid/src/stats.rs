//! Local statistics for map backends.
//!
//! Counters are plain atomics updated on every operation; [`LocalMapStats`] is a point-in-time
//! snapshot of them.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot of a map's local statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalMapStats {
    /// Entries currently held
    pub owned_entry_count: u64,
    /// Reads that found an entry
    pub hits: u64,
    pub get_operation_count: u64,
    pub put_operation_count: u64,
    pub remove_operation_count: u64,
    /// Clears, membership checks and other operations
    pub other_operation_count: u64,
    /// Creation time (Unix millis)
    pub creation_time: u64,
    /// Last read or write (Unix millis), 0 if never accessed
    pub last_access_time: u64,
    /// Last write (Unix millis), 0 if never updated
    pub last_update_time: u64,
    /// Present when the map is fronted by a near cache
    pub near_cache_stats: Option<NearCacheStats>,
}

impl LocalMapStats {
    pub fn total_operation_count(&self) -> u64 {
        self.get_operation_count
            + self.put_operation_count
            + self.remove_operation_count
            + self.other_operation_count
    }
}

/// Snapshot of a near cache's statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearCacheStats {
    pub owned_entry_count: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

impl NearCacheStats {
    /// Hit ratio in percent
    pub fn ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            (self.hits as f64 / lookups as f64) * 100.0
        }
    }
}

#[derive(Debug)]
pub(crate) struct MapStatsCounters {
    hits: AtomicU64,
    gets: AtomicU64,
    puts: AtomicU64,
    removes: AtomicU64,
    others: AtomicU64,
    creation_time: u64,
    last_access_time: AtomicU64,
    last_update_time: AtomicU64,
}

impl MapStatsCounters {
    pub(crate) fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            removes: AtomicU64::new(0),
            others: AtomicU64::new(0),
            creation_time: current_timestamp_ms(),
            last_access_time: AtomicU64::new(0),
            last_update_time: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        self.last_access_time
            .store(current_timestamp_ms(), Ordering::Relaxed);
    }

    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.touch_update();
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
        self.touch_update();
    }

    pub(crate) fn record_other(&self, mutating: bool) {
        self.others.fetch_add(1, Ordering::Relaxed);
        if mutating {
            self.touch_update();
        } else {
            self.last_access_time
                .store(current_timestamp_ms(), Ordering::Relaxed);
        }
    }

    fn touch_update(&self) {
        let now = current_timestamp_ms();
        self.last_access_time.store(now, Ordering::Relaxed);
        self.last_update_time.store(now, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, owned_entry_count: u64) -> LocalMapStats {
        LocalMapStats {
            owned_entry_count,
            hits: self.hits.load(Ordering::Relaxed),
            get_operation_count: self.gets.load(Ordering::Relaxed),
            put_operation_count: self.puts.load(Ordering::Relaxed),
            remove_operation_count: self.removes.load(Ordering::Relaxed),
            other_operation_count: self.others.load(Ordering::Relaxed),
            creation_time: self.creation_time,
            last_access_time: self.last_access_time.load(Ordering::Relaxed),
            last_update_time: self.last_update_time.load(Ordering::Relaxed),
            near_cache_stats: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct NearCacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl NearCacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, owned_entry_count: u64, evictions: u64) -> NearCacheStats {
        NearCacheStats {
            owned_entry_count,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions,
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
