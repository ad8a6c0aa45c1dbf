use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::repo::ProfileStore;
use super::repo_types::{ProfileColumns, UserProfile};
use super::services::{fetch_profile, lock, LoadOutcome};

/// What the public profile page renders. Absent fields read as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileView {
    avatar: Option<String>,
    name: Option<String>,
    about: Option<String>,
}

impl ProfileView {
    pub fn avatar(&self) -> &str {
        self.avatar.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn about(&self) -> &str {
        self.about.as_deref().unwrap_or_default()
    }
}

impl From<UserProfile> for ProfileView {
    fn from(row: UserProfile) -> Self {
        Self {
            avatar: row.avatar,
            name: row.name,
            about: row.about,
        }
    }
}

/// Read-only profile display bound to one profile id for its whole lifetime.
pub struct ProfileLoader {
    store: Arc<dyn ProfileStore>,
    profile_id: Uuid,
    view: Mutex<ProfileView>,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl ProfileLoader {
    pub fn mount(store: Arc<dyn ProfileStore>, profile_id: Uuid) -> Self {
        Self {
            store,
            profile_id,
            view: Mutex::new(ProfileView::default()),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn profile_id(&self) -> Uuid {
        self.profile_id
    }

    pub fn view(&self) -> ProfileView {
        lock(&self.view).clone()
    }

    /// Runs the single read of this loader. Failures are logged and leave
    /// the view empty.
    #[instrument(skip(self), fields(profile_id = %self.profile_id))]
    pub async fn load(&self) -> LoadOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return LoadOutcome::Skipped;
        }

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("loader unmounted before read completed");
                return LoadOutcome::Cancelled;
            }
            r = fetch_profile(self.store.as_ref(), self.profile_id, ProfileColumns::All) => r,
        };

        match result {
            Ok(row) => {
                *lock(&self.view) = ProfileView::from(row);
                LoadOutcome::Loaded
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "profile load failed");
                LoadOutcome::Failed
            }
        }
    }

    pub fn unmount(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProfileLoader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
