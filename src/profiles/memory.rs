use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::repo::ProfileStore;
use super::repo_types::{ProfileColumns, ProfileUpsert, UserProfile};

/// In-memory `users` table for tests.
#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<Uuid, UserProfile>>,
    latency: Option<Duration>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    upserts: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn insert(&self, row: UserProfile) {
        self.rows.lock().unwrap().insert(row.id, row);
    }

    pub fn get(&self, id: Uuid) -> Option<UserProfile> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) -> anyhow::Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("backend unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch(&self, id: Uuid, columns: ProfileColumns) -> anyhow::Result<Option<UserProfile>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        let row = self.get(id).map(|mut row| {
            if columns == ProfileColumns::Editable {
                row.show_groups = false;
                row.notify_by_email = false;
            }
            row
        });
        Ok(row)
    }

    async fn upsert(&self, record: &ProfileUpsert) -> anyhow::Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows.entry(record.id).or_insert_with(|| UserProfile {
            id: record.id,
            ..UserProfile::default()
        });
        row.name = record.name.clone();
        row.about = record.about.clone();
        row.avatar = record.avatar.clone();
        Ok(())
    }
}
