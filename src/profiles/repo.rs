use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ProfileColumns, ProfileUpsert, UserProfile};

/// Access to the hosted `users` table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read the row keyed by `id`, if any.
    async fn fetch(&self, id: Uuid, columns: ProfileColumns) -> anyhow::Result<Option<UserProfile>>;
    /// Insert the row, or overwrite `name`, `about` and `avatar` of the existing one.
    async fn upsert(&self, record: &ProfileUpsert) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch(&self, id: Uuid, columns: ProfileColumns) -> anyhow::Result<Option<UserProfile>> {
        let sql = format!(
            "SELECT {} FROM users WHERE user_id = $1",
            columns.select_list()
        );
        let row = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("select profile")?;
        Ok(row)
    }

    async fn upsert(&self, record: &ProfileUpsert) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, name, about, avatar)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
               SET name = EXCLUDED.name,
                   about = EXCLUDED.about,
                   avatar = EXCLUDED.avatar
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.about)
        .bind(&record.avatar)
        .execute(&self.db)
        .await
        .context("upsert profile")?;
        Ok(())
    }
}
