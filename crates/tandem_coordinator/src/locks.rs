//! Per-filename async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

type LockTable = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

fn lock_table(table: &Mutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A set of named async mutexes, created on demand and dropped when unused.
///
/// Serializes the check-then-write sequence for a filename within one process.
/// Across processes the record store's unique constraint is what counts.
#[derive(Debug, Clone, Default)]
pub struct NameLocks {
    table: Arc<Mutex<LockTable>>,
}

/// Holds the locks for a set of names until dropped.
#[derive(Debug)]
pub struct NameGuard {
    table: Arc<Mutex<LockTable>>,
    held: Vec<OwnedMutexGuard<()>>,
}

impl NameLocks {
    /// Create an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every name in `names`.
    ///
    /// Names are locked in sorted order, so callers locking overlapping sets
    /// cannot deadlock.
    pub async fn lock<S: AsRef<str>>(&self, names: &[S]) -> NameGuard {
        let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guard = NameGuard {
            table: Arc::clone(&self.table),
            held: Vec::with_capacity(sorted.len()),
        };
        for name in sorted {
            let mutex = Arc::clone(lock_table(&self.table).entry(name.to_string()).or_default());
            guard.held.push(mutex.lock_owned().await);
        }
        guard
    }

    /// Number of names currently locked or waited on.
    pub fn active(&self) -> usize {
        lock_table(&self.table).len()
    }
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        let mut table = lock_table(&self.table);
        self.held.clear();
        // Entries only the table still references have no holder and no waiter
        table.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_name_is_exclusive() {
        let locks = NameLocks::new();
        let guard = locks.lock(&["a.txt"]).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(&["a.txt"]).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_names_do_not_block() {
        let locks = NameLocks::new();
        let _a = locks.lock(&["a.txt"]).await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock(&["b.txt"]))
            .await
            .expect("independent names must not contend");
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_sets_in_any_order() {
        let locks = NameLocks::new();
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    let names = if i % 2 == 0 { ["x", "y"] } else { ["y", "x"] };
                    let _g = locks.lock(&names).await;
                    tokio::task::yield_now().await;
                })
            })
            .collect();

        for task in tasks {
            tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .expect("lock ordering must prevent deadlock")
                .unwrap();
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_lock_once() {
        let locks = NameLocks::new();
        let guard = tokio::time::timeout(Duration::from_secs(1), locks.lock(&["a", "a"]))
            .await
            .expect("a name listed twice must not self-deadlock");
        assert_eq!(guard.held.len(), 1);
    }
}
