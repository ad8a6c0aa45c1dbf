use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use super::editor::ProfileEditor;
use super::notify::Notifier;
use super::repo::ProfileStore;
use super::services::lock;

struct Session {
    editor: Arc<ProfileEditor>,
    last_used: Instant,
}

/// Live profile editors, one per signed-in user. Sessions untouched for
/// `idle_ttl` are unmounted the next time the registry is used.
pub struct EditorSessions {
    store: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    idle_ttl: Duration,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl EditorSessions {
    pub fn new(store: Arc<dyn ProfileStore>, notifier: Arc<dyn Notifier>, idle_ttl: Duration) -> Self {
        Self {
            store,
            notifier,
            idle_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn new_editor(&self, user_id: Uuid) -> Arc<ProfileEditor> {
        Arc::new(ProfileEditor::mount(
            self.store.clone(),
            self.notifier.clone(),
            user_id,
        ))
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Session>, now: Instant) {
        sessions.retain(|user_id, session| {
            let idle = now.saturating_duration_since(session.last_used) >= self.idle_ttl;
            if idle {
                debug!(%user_id, "evicting idle profile editor");
                session.editor.unmount();
            }
            !idle
        });
    }

    /// Mounts a fresh editor for `user_id`, unmounting the previous one.
    pub fn mount(&self, user_id: Uuid) -> Arc<ProfileEditor> {
        let now = Instant::now();
        let editor = self.new_editor(user_id);
        let mut sessions = lock(&self.sessions);
        self.evict_idle(&mut sessions, now);
        let replaced = sessions.insert(
            user_id,
            Session {
                editor: editor.clone(),
                last_used: now,
            },
        );
        if let Some(old) = replaced {
            debug!(%user_id, "replacing profile editor");
            old.editor.unmount();
        }
        editor
    }

    /// Returns the live editor for `user_id`, mounting one if there is none.
    /// Lookup and insert happen under a single lock hold.
    pub fn get_or_mount(&self, user_id: Uuid) -> Arc<ProfileEditor> {
        let now = Instant::now();
        let mut sessions = lock(&self.sessions);
        self.evict_idle(&mut sessions, now);
        let session = sessions.entry(user_id).or_insert_with(|| Session {
            editor: self.new_editor(user_id),
            last_used: now,
        });
        if session.editor.is_unmounted() {
            session.editor = self.new_editor(user_id);
        }
        session.last_used = now;
        session.editor.clone()
    }

    /// Like `get_or_mount`, but a never-loaded editor is loaded before it is
    /// handed out, so edits and submits start from the stored row.
    pub async fn acquire(&self, user_id: Uuid) -> Arc<ProfileEditor> {
        let editor = self.get_or_mount(user_id);
        if editor.needs_load() {
            editor.load().await;
        }
        editor
    }

    /// Drops the user's editor and cancels whatever it has in flight.
    pub fn unmount(&self, user_id: Uuid) -> bool {
        match lock(&self.sessions).remove(&user_id) {
            Some(session) => {
                session.editor.unmount();
                true
            }
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}
