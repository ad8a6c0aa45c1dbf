use serde::{Deserialize, Serialize};

use super::editor::{ProfileEditor, ProfileForm};
use super::loader::ProfileView;

/// Public profile card. `id` echoes the requested profile id.
#[derive(Debug, Serialize)]
pub struct ProfileViewResponse {
    pub id: String,
    pub avatar: String,
    pub name: String,
    pub about: String,
}

impl ProfileViewResponse {
    pub fn new(id: impl Into<String>, view: &ProfileView) -> Self {
        Self {
            id: id.into(),
            avatar: view.avatar().to_string(),
            name: view.name().to_string(),
            about: view.about().to_string(),
        }
    }
}

/// The caller's editable profile plus the editor's loading flag.
#[derive(Debug, Serialize)]
pub struct ProfileFormResponse {
    #[serde(flatten)]
    pub form: ProfileForm,
    pub loading: bool,
}

impl From<&ProfileEditor> for ProfileFormResponse {
    fn from(editor: &ProfileEditor) -> Self {
        Self {
            form: editor.form(),
            loading: editor.is_loading(),
        }
    }
}

/// Field edits. Omitted fields keep their current value in the form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditProfileRequest {
    pub name: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<String>,
    pub show_groups: Option<bool>,
    pub notify_by_email: Option<bool>,
}

impl EditProfileRequest {
    pub fn apply_to(self, editor: &ProfileEditor) {
        if let Some(name) = self.name {
            editor.set_name(name);
        }
        if let Some(about) = self.about {
            editor.set_about(about);
        }
        if let Some(avatar) = self.avatar {
            editor.set_avatar(avatar);
        }
        if let Some(show) = self.show_groups {
            editor.set_show_groups(show);
        }
        if let Some(notify) = self.notify_by_email {
            editor.set_notify_by_email(notify);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileFormResponse>,
}

impl SubmitResponse {
    pub fn message(message: &str) -> Self {
        Self {
            message: message.to_string(),
            profile: None,
        }
    }
}
