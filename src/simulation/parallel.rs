//! Fan-out/join primitive shared by every phase of a tick
//!
//! Each phase spawns one task per entity, waits for all of them and only
//! then reports what went wrong. No task is cancelled because a sibling
//! failed.

use rayon::prelude::*;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::SimError;

/// Run `f` on every item in parallel and collect every error.
///
/// Returns once all tasks have finished. The order of the returned errors
/// follows the iteration order of `items`, not the order in which tasks
/// happened to complete.
pub fn fan_out<I, F>(items: I, f: F) -> Vec<SimError>
where
    I: IntoParallelIterator,
    F: Fn(I::Item) -> Result<(), SimError> + Sync + Send,
{
    items
        .into_par_iter()
        .filter_map(|item| f(item).err())
        .collect()
}

/// Acquire an entity guard. A poisoned lock only means another task of the
/// same (already failed) run panicked, so the data is taken as-is.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
