use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

/// Where the `users` table lives.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Postgres { database_url: String },
    Rest { api_url: String, api_key: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub jwt: JwtConfig,
    pub signout_redirect: String,
    /// Profile editor sessions idle this long are dropped.
    pub editor_idle: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| var(key).ok_or_else(|| anyhow::anyhow!("{key} must be set"));

        let backend = match var("PROFILE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => BackendConfig::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            "rest" => BackendConfig::Rest {
                api_url: required("DATA_API_URL")?,
                api_key: required("DATA_API_KEY")?,
            },
            other => anyhow::bail!("unknown PROFILE_BACKEND {other:?}"),
        };

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "studycrew".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "studycrew-users".into()),
        };

        let editor_idle_secs = match var("EDITOR_IDLE_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("EDITOR_IDLE_SECS {v:?}: {e}"))?,
            None => 30 * 60,
        };

        Ok(Self {
            backend,
            jwt,
            signout_redirect: var("SIGNOUT_REDIRECT").unwrap_or_else(|| "/login".into()),
            editor_idle: Duration::from_secs(editor_idle_secs),
        })
    }
}
