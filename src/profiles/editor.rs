use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::notify::{Alert, Notifier};
use super::repo::ProfileStore;
use super::repo_types::{ProfileColumns, ProfileUpsert};
use super::services::{fetch_profile, lock, save_profile, LoadOutcome};

/// Editable copy of the caller's profile. Absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<String>,
    pub show_groups: bool,
    pub notify_by_email: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved,
    Failed,
    /// Submit arrived before the first load finished, or while another
    /// load or submit was in flight.
    Ignored,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LoadState {
    #[default]
    Pending,
    Running,
    Done,
}

#[derive(Default)]
struct EditorState {
    form: ProfileForm,
    load: LoadState,
    in_flight: usize,
}

/// Marks one operation in flight; dropping it (completion or an abandoned
/// future) ends the operation. An unfinished load goes back to `Pending`.
struct InFlight<'a>(&'a Mutex<EditorState>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut st = lock(self.0);
        st.in_flight -= 1;
        if st.load == LoadState::Running {
            st.load = LoadState::Pending;
        }
    }
}

/// The signed-in user's profile form. Every write targets `user_id`.
pub struct ProfileEditor {
    store: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    user_id: Uuid,
    state: Mutex<EditorState>,
    cancel: CancellationToken,
}

impl ProfileEditor {
    pub fn mount(store: Arc<dyn ProfileStore>, notifier: Arc<dyn Notifier>, user_id: Uuid) -> Self {
        Self {
            store,
            notifier,
            user_id,
            state: Mutex::new(EditorState::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn form(&self) -> ProfileForm {
        lock(&self.state).form.clone()
    }

    /// True until the first load finishes and while any load or submit is
    /// in flight. Submits are ignored then.
    pub fn is_loading(&self) -> bool {
        let st = lock(&self.state);
        st.in_flight > 0 || st.load != LoadState::Done
    }

    /// True while no load has run to completion or is running.
    pub fn needs_load(&self) -> bool {
        lock(&self.state).load == LoadState::Pending
    }

    pub fn set_name(&self, name: impl Into<String>) {
        lock(&self.state).form.name = Some(name.into());
    }

    pub fn set_about(&self, about: impl Into<String>) {
        lock(&self.state).form.about = Some(about.into());
    }

    pub fn set_avatar(&self, avatar: impl Into<String>) {
        lock(&self.state).form.avatar = Some(avatar.into());
    }

    pub fn set_show_groups(&self, show: bool) {
        lock(&self.state).form.show_groups = show;
    }

    pub fn set_notify_by_email(&self, notify: bool) {
        lock(&self.state).form.notify_by_email = notify;
    }

    /// Reads the caller's row into the form. Runs once per mount; a load
    /// that was cancelled or abandoned may be run again.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn load(&self) -> LoadOutcome {
        let _in_flight = {
            let mut st = lock(&self.state);
            if st.load != LoadState::Pending {
                return LoadOutcome::Skipped;
            }
            st.load = LoadState::Running;
            st.in_flight += 1;
            InFlight(&self.state)
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            r = fetch_profile(self.store.as_ref(), self.user_id, ProfileColumns::Editable) => Some(r),
        };

        match result {
            None => {
                debug!("editor unmounted before load completed");
                LoadOutcome::Cancelled
            }
            Some(Ok(row)) => {
                let mut st = lock(&self.state);
                st.form.name = row.name;
                st.form.about = row.about;
                st.form.avatar = row.avatar;
                st.load = LoadState::Done;
                LoadOutcome::Loaded
            }
            Some(Err(e)) => {
                warn!(error = %e, kind = e.kind(), "profile form load failed");
                lock(&self.state).load = LoadState::Done;
                self.notifier.alert(self.user_id, Alert::LoadFailed);
                LoadOutcome::Failed
            }
        }
    }

    /// Upserts the caller's row with the current `name`, `about` and `avatar`.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn submit(&self) -> SubmitOutcome {
        let (record, _in_flight) = {
            let mut st = lock(&self.state);
            if st.in_flight > 0 || st.load != LoadState::Done {
                debug!("submit ignored while loading");
                return SubmitOutcome::Ignored;
            }
            st.in_flight += 1;
            let record = ProfileUpsert {
                id: self.user_id,
                name: st.form.name.clone(),
                about: st.form.about.clone(),
                avatar: st.form.avatar.clone(),
            };
            (record, InFlight(&self.state))
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            r = save_profile(self.store.as_ref(), &record) => Some(r),
        };

        match result {
            None => {
                debug!("editor unmounted before submit completed");
                SubmitOutcome::Cancelled
            }
            Some(Ok(())) => {
                info!("profile updated");
                self.notifier.alert(self.user_id, Alert::ProfileUpdated);
                SubmitOutcome::Saved
            }
            Some(Err(e)) => {
                warn!(error = %e, kind = e.kind(), "profile update failed");
                self.notifier.alert(self.user_id, Alert::UpdateFailed);
                SubmitOutcome::Failed
            }
        }
    }

    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_unmounted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ProfileEditor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod editor_tests {
    use std::time::Duration;

    use super::*;
    use crate::profiles::memory::MemoryProfileStore;
    use crate::profiles::notify::recording::RecordingNotifier;
    use crate::profiles::repo_types::UserProfile;

    fn editor(store: &Arc<MemoryProfileStore>, user_id: Uuid) -> (ProfileEditor, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let editor = ProfileEditor::mount(store.clone(), notifier.clone(), user_id);
        (editor, notifier)
    }

    #[tokio::test]
    async fn load_populates_form_and_keeps_absent_fields_none() {
        let store = Arc::new(MemoryProfileStore::new());
        let id = Uuid::new_v4();
        store.insert(UserProfile {
            id,
            name: Some("Ada".into()),
            about: None,
            avatar: Some("a.png".into()),
            show_groups: true,
            notify_by_email: true,
        });

        let (editor, notifier) = editor(&store, id);
        assert_eq!(editor.load().await, LoadOutcome::Loaded);

        let form = editor.form();
        assert_eq!(form.name.as_deref(), Some("Ada"));
        assert_eq!(form.about, None);
        assert_eq!(form.avatar.as_deref(), Some("a.png"));
        assert!(!editor.is_loading());
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn load_of_missing_row_alerts_and_leaves_fields_none() {
        let store = Arc::new(MemoryProfileStore::new());
        let (editor, notifier) = editor(&store, Uuid::new_v4());

        assert_eq!(editor.load().await, LoadOutcome::Failed);
        assert_eq!(editor.form(), ProfileForm::default());
        assert_eq!(notifier.alerts(), vec![Alert::LoadFailed]);
        assert!(!editor.is_loading());
    }

    #[tokio::test]
    async fn submit_then_load_round_trips() {
        let store = Arc::new(MemoryProfileStore::new());
        let id = Uuid::new_v4();

        let (first, notifier) = editor(&store, id);
        assert_eq!(first.load().await, LoadOutcome::Failed);
        first.set_name("Ada");
        first.set_about("Bio");
        first.set_avatar("a.png");
        assert_eq!(first.submit().await, SubmitOutcome::Saved);
        assert_eq!(notifier.alerts(), vec![Alert::LoadFailed, Alert::ProfileUpdated]);

        let (second, _) = editor(&store, id);
        second.load().await;
        let form = second.form();
        assert_eq!(form.name.as_deref(), Some("Ada"));
        assert_eq!(form.about.as_deref(), Some("Bio"));
        assert_eq!(form.avatar.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn submit_failure_alerts_and_clears_loading() {
        let store = Arc::new(MemoryProfileStore::new());
        let (editor, notifier) = editor(&store, Uuid::new_v4());
        editor.load().await;
        store.set_failing(true);
        editor.set_name("Ada");

        assert_eq!(editor.submit().await, SubmitOutcome::Failed);
        assert_eq!(notifier.alerts(), vec![Alert::LoadFailed, Alert::UpdateFailed]);
        assert!(!editor.is_loading());
    }

    #[tokio::test]
    async fn submit_before_first_load_is_ignored() {
        let store = Arc::new(MemoryProfileStore::new());
        let id = Uuid::new_v4();
        store.insert(UserProfile {
            id,
            name: Some("Ada".into()),
            avatar: Some("a.png".into()),
            ..UserProfile::default()
        });
        let (editor, _) = editor(&store, id);
        assert!(editor.is_loading());
        editor.set_about("new bio");

        assert_eq!(editor.submit().await, SubmitOutcome::Ignored);
        assert_eq!(store.upsert_count(), 0);
        assert_eq!(store.get(id).unwrap().name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn second_load_is_skipped() {
        let store = Arc::new(MemoryProfileStore::new());
        let (editor, _) = editor(&store, Uuid::new_v4());

        assert_eq!(editor.load().await, LoadOutcome::Failed);
        assert_eq!(editor.load().await, LoadOutcome::Skipped);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn double_submit_issues_one_upsert() {
        let store = Arc::new(MemoryProfileStore::with_latency(Duration::from_millis(20)));
        let (editor, notifier) = editor(&store, Uuid::new_v4());
        editor.load().await;
        editor.set_name("Ada");

        let (first, second) = tokio::join!(editor.submit(), editor.submit());

        assert_eq!(first, SubmitOutcome::Saved);
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(store.upsert_count(), 1);
        assert_eq!(notifier.alerts(), vec![Alert::LoadFailed, Alert::ProfileUpdated]);
    }

    #[tokio::test]
    async fn submit_during_load_is_ignored() {
        let store = Arc::new(MemoryProfileStore::with_latency(Duration::from_millis(20)));
        let id = Uuid::new_v4();
        store.insert(UserProfile {
            id,
            name: Some("Ada".into()),
            ..UserProfile::default()
        });
        let (editor, _) = editor(&store, id);

        let (loaded, submitted) = tokio::join!(editor.load(), editor.submit());

        assert_eq!(loaded, LoadOutcome::Loaded);
        assert_eq!(submitted, SubmitOutcome::Ignored);
        assert_eq!(store.upsert_count(), 0);
    }

    #[tokio::test]
    async fn abandoned_submit_clears_loading() {
        let store = Arc::new(MemoryProfileStore::with_latency(Duration::from_millis(50)));
        let (editor, _) = editor(&store, Uuid::new_v4());
        editor.load().await;
        editor.set_name("Ada");

        let abandoned = tokio::time::timeout(Duration::from_millis(5), editor.submit()).await;
        assert!(abandoned.is_err());
        assert!(!editor.is_loading());

        assert_eq!(editor.submit().await, SubmitOutcome::Saved);
        assert_eq!(store.upsert_count(), 2);
    }

    #[tokio::test]
    async fn abandoned_load_can_run_again() {
        let store = Arc::new(MemoryProfileStore::with_latency(Duration::from_millis(50)));
        let id = Uuid::new_v4();
        store.insert(UserProfile {
            id,
            name: Some("Ada".into()),
            ..UserProfile::default()
        });
        let (editor, _) = editor(&store, id);

        let abandoned = tokio::time::timeout(Duration::from_millis(5), editor.load()).await;
        assert!(abandoned.is_err());
        assert!(editor.needs_load());

        assert_eq!(editor.load().await, LoadOutcome::Loaded);
        assert!(!editor.is_loading());
        assert_eq!(editor.form().name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn toggles_are_editable_but_not_written() {
        let store = Arc::new(MemoryProfileStore::new());
        let id = Uuid::new_v4();
        store.insert(UserProfile {
            id,
            show_groups: true,
            ..UserProfile::default()
        });
        let (editor, _) = editor(&store, id);
        editor.load().await;
        editor.set_show_groups(false);
        editor.set_notify_by_email(true);
        editor.set_name("Ada");

        assert_eq!(editor.submit().await, SubmitOutcome::Saved);
        assert!(editor.form().notify_by_email);

        let stored = store.get(id).unwrap();
        assert_eq!(stored.name.as_deref(), Some("Ada"));
        assert!(stored.show_groups);
        assert!(!stored.notify_by_email);
    }

    #[tokio::test]
    async fn unmount_cancels_in_flight_submit_without_alert() {
        let store = Arc::new(MemoryProfileStore::with_latency(Duration::from_millis(50)));
        let (editor, notifier) = editor(&store, Uuid::new_v4());
        let editor = Arc::new(editor);
        editor.load().await;
        editor.set_name("Ada");

        let task = tokio::spawn({
            let editor = editor.clone();
            async move { editor.submit().await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        editor.unmount();

        assert_eq!(task.await.unwrap(), SubmitOutcome::Cancelled);
        assert_eq!(notifier.alerts(), vec![Alert::LoadFailed]);
        assert!(!editor.is_loading());
        assert!(editor.is_unmounted());
    }
}
