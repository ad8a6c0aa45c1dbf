use thiserror::Error;
use uuid::Uuid;

/// Failures of a profile read or write. Both kinds are handled the same way
/// by the components: logged or alerted, never retried.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile {0} not found")]
    NotFound(Uuid),
    #[error("profile backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

impl ProfileError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProfileError::NotFound(_) => "not_found",
            ProfileError::Backend(_) => "backend",
        }
    }
}
