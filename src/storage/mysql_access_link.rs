use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::AccessLink;
use crate::storage::mysql::{millis_to_datetime, MySqlStorage};
use crate::storage::{AccessLinkStore, Result, StorageError};

type AccessLinkRow = (String, String, bool, i64, i64, Option<i64>);

fn row_to_link(row: AccessLinkRow) -> Result<AccessLink> {
    let (token, registration_number, is_used, created_at, expires_at, used_at) = row;
    Ok(AccessLink {
        token,
        registration_number,
        is_used,
        created_at: millis_to_datetime(created_at)?,
        expires_at: millis_to_datetime(expires_at)?,
        used_at: used_at.map(millis_to_datetime).transpose()?,
    })
}

#[async_trait]
impl AccessLinkStore for MySqlStorage {
    async fn insert_access_link(&self, link: &AccessLink) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO access_links (
                token, registration_number, is_used, created_at, expires_at, used_at
              ) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&link.token)
        .bind(&link.registration_number)
        .bind(link.is_used)
        .bind(link.created_at.timestamp_millis())
        .bind(link.expires_at.timestamp_millis())
        .bind(link.used_at.map(|t| t.timestamp_millis()))
        .execute(self.get_sqlx_pool())
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }

    async fn find_access_link(&self, token: &str) -> Result<Option<AccessLink>> {
        let row: Option<AccessLinkRow> = sqlx::query_as(
            r#"SELECT token, registration_number, is_used, created_at, expires_at, used_at
              FROM access_links
              WHERE token = ?"#,
        )
        .bind(token)
        .fetch_optional(self.get_sqlx_pool())
        .await
        .map_err(StorageError::from)?;

        row.map(row_to_link).transpose()
    }

    async fn mark_access_link_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE access_links
              SET is_used = TRUE, used_at = COALESCE(used_at, ?)
              WHERE token = ?"#,
        )
        .bind(used_at.timestamp_millis())
        .bind(token)
        .execute(self.get_sqlx_pool())
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // MySQL reports zero affected rows when nothing changed, which is
        // also the case for an already-used link.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM access_links WHERE token = ?")
            .bind(token)
            .fetch_one(self.get_sqlx_pool())
            .await
            .map_err(StorageError::from)?;
        debug!("mark_access_link_used changed nothing, row exists: {}", count > 0);
        Ok(count > 0)
    }
}
