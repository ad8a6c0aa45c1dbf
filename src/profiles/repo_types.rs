use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Profile record in the `users` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    #[serde(rename = "user_id")]
    #[sqlx(rename = "user_id")]
    pub id: Uuid,                   // backend-assigned, never written by clients
    pub name: Option<String>,       // display name
    pub about: Option<String>,      // bio
    pub avatar: Option<String>,     // avatar URL or storage key
    #[serde(default)]
    #[sqlx(default)]
    pub show_groups: bool,          // show study groups on public profile
    #[serde(default)]
    #[sqlx(default)]
    pub notify_by_email: bool,      // email notification preference
}

/// Payload written by an upsert. The preference toggles are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpsert {
    #[serde(rename = "user_id")]
    pub id: Uuid,
    pub name: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<String>,
}

/// Which columns a read selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileColumns {
    /// Every column (`*`).
    All,
    /// `name, about, avatar`.
    Editable,
}

impl ProfileColumns {
    pub fn select_list(self) -> &'static str {
        match self {
            ProfileColumns::All => "user_id, name, about, avatar, show_groups, notify_by_email",
            ProfileColumns::Editable => "user_id, name, about, avatar",
        }
    }
}
