use tracing::{info, warn};
use uuid::Uuid;

/// Blocking, user-facing notification raised by the profile editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    LoadFailed,
    ProfileUpdated,
    UpdateFailed,
}

impl Alert {
    pub fn message(self) -> &'static str {
        match self {
            Alert::LoadFailed => "Error fetching profile data!",
            Alert::ProfileUpdated => "Profile updated!",
            Alert::UpdateFailed => "Error updating the data!",
        }
    }

    pub fn is_error(self) -> bool {
        !matches!(self, Alert::ProfileUpdated)
    }
}

pub trait Notifier: Send + Sync {
    fn alert(&self, user_id: Uuid, alert: Alert);
}

/// Writes alerts to the service log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, user_id: Uuid, alert: Alert) {
        if alert.is_error() {
            warn!(%user_id, message = alert.message(), "profile alert");
        } else {
            info!(%user_id, message = alert.message(), "profile alert");
        }
    }
}
