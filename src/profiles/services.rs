use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::errors::ProfileError;
use super::repo::ProfileStore;
use super::repo_types::{ProfileColumns, ProfileUpsert, UserProfile};

/// Outcome of a component's read. Failures are already logged or alerted
/// by the time the caller sees this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
    /// The component was unmounted before the read completed.
    Cancelled,
    /// The component already ran its one load.
    Skipped,
}

/// Read exactly one profile row, classifying a missing row as `NotFound`.
pub async fn fetch_profile(
    store: &dyn ProfileStore,
    id: Uuid,
    columns: ProfileColumns,
) -> Result<UserProfile, ProfileError> {
    store
        .fetch(id, columns)
        .await?
        .ok_or(ProfileError::NotFound(id))
}

pub async fn save_profile(store: &dyn ProfileStore, record: &ProfileUpsert) -> Result<(), ProfileError> {
    store.upsert(record).await?;
    Ok(())
}

/// Component state is never left half-written, so a poisoned lock is still usable.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
