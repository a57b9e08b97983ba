//! Atomically swappable rate-table snapshots
//!
//! Readers take an `Arc` to the current tables and rate against it for the
//! whole request. A reload builds and validates a fresh value off to the side,
//! then swaps the pointer. A request therefore sees either the old tables or
//! the new ones, never a mix, and a failed reload leaves the old tables live.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::TableError;
use crate::tables::RateTables;

/// Holder of the live rate tables
#[derive(Debug)]
pub struct RateTableStore {
    current: RwLock<Arc<RateTables>>,
    generation: AtomicU64,
}

impl RateTableStore {
    pub fn new(tables: RateTables) -> Self {
        Self {
            current: RwLock::new(Arc::new(tables)),
            generation: AtomicU64::new(1),
        }
    }

    /// Loads and validates tables from disk and wraps them in a store
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TableError> {
        RateTables::load_from_path(path).map(Self::new)
    }

    /// Current tables; the snapshot stays valid after a later publish
    pub fn snapshot(&self) -> Arc<RateTables> {
        // The lock only guards a pointer swap, so a poisoned lock still holds a valid Arc
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the live tables and returns the previous snapshot
    pub fn publish(&self, tables: RateTables) -> Arc<RateTables> {
        let next = Arc::new(tables);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::info!(
            generation,
            version = self.snapshot().version().unwrap_or("unversioned"),
            "Published rate tables"
        );
        previous
    }

    /// Loads tables from disk and publishes them if they validate
    ///
    /// On error the live tables are left untouched.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<Arc<RateTables>, TableError> {
        let path = path.as_ref();
        match RateTables::load_from_path(path) {
            Ok(tables) => Ok(self.publish(tables)),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    generation = self.generation(),
                    "Rate table reload rejected; keeping current tables"
                );
                Err(err)
            }
        }
    }

    /// Number of table sets published so far, starting at 1
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(version: &str) -> RateTables {
        RateTables::new(Some(version.to_string()), Vec::new()).unwrap()
    }

    #[test]
    fn test_publish_swaps_and_returns_previous() {
        let store = RateTableStore::new(tables("v1"));
        let held = store.snapshot();

        let previous = store.publish(tables("v2"));

        assert_eq!(previous.version(), Some("v1"));
        assert_eq!(held.version(), Some("v1"));
        assert_eq!(store.snapshot().version(), Some("v2"));
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_current_tables() {
        let store = RateTableStore::new(tables("v1"));

        let err = store.reload_from_path("/nonexistent/rate-tables.json").unwrap_err();

        assert!(matches!(err, TableError::Io { .. }));
        assert_eq!(store.snapshot().version(), Some("v1"));
        assert_eq!(store.generation(), 1);
    }
}
