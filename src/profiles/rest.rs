use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use super::repo::ProfileStore;
use super::repo_types::{ProfileColumns, ProfileUpsert, UserProfile};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `users` table behind a hosted PostgREST-style data API.
#[derive(Clone)]
pub struct RestProfileStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestProfileStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/users", self.base_url)
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn fetch(&self, id: Uuid, columns: ProfileColumns) -> anyhow::Result<Option<UserProfile>> {
        let select = columns.select_list().replace(' ', "");
        let filter = format!("eq.{}", id);
        let response = self
            .auth_request(self.client.get(self.table_url()))
            .query(&[("user_id", filter.as_str()), ("select", select.as_str())])
            .send()
            .await
            .context("data api select")?
            .error_for_status()
            .context("data api select status")?;

        let mut rows: Vec<UserProfile> = response.json().await.context("decode profile rows")?;
        debug!(user_id = %id, rows = rows.len(), "data api select");
        anyhow::ensure!(rows.len() <= 1, "expected at most one profile row for {id}");
        Ok(rows.pop())
    }

    async fn upsert(&self, record: &ProfileUpsert) -> anyhow::Result<()> {
        self.auth_request(self.client.post(self.table_url()))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await
            .context("data api upsert")?
            .error_for_status()
            .context("data api upsert status")?;
        Ok(())
    }
}
