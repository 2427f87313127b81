//! Poison-tolerant guards for shared maps touched by every connection handler.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                hint = "state may be stale after panic in another task",
                "Recovered from poisoned lock"
            );
            poisoned.into_inner()
        }
    }
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                hint = "state may be stale after panic in another task",
                "Recovered from poisoned lock"
            );
            poisoned.into_inner()
        }
    }
}
