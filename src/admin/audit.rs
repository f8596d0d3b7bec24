/// Admin activity log
///
/// Append-only audit trail. This module can write and read entries; nothing
/// in the service mutates or deletes them.
use crate::{admin::ClientInfo, error::AdminResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteExecutor, SqlitePool};

/// Audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub admin_id: i64,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub detail: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ActivityLog {
    db: SqlitePool,
}

impl ActivityLog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append an entry
    pub async fn append(
        &self,
        admin_id: i64,
        action: &str,
        resource: Option<(&str, &str)>,
        detail: Option<&str>,
        client: &ClientInfo,
    ) -> AdminResult<()> {
        self.append_with(&self.db, admin_id, action, resource, detail, client)
            .await
    }

    /// Append an entry through the caller's executor, so audit writes can
    /// join a surrounding transaction
    pub async fn append_with<'e>(
        &self,
        exec: impl SqliteExecutor<'e>,
        admin_id: i64,
        action: &str,
        resource: Option<(&str, &str)>,
        detail: Option<&str>,
        client: &ClientInfo,
    ) -> AdminResult<()> {
        sqlx::query(
            "INSERT INTO admin_activity_log
                 (admin_id, action, resource_type, resource_id, detail, ip, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(admin_id)
        .bind(action)
        .bind(resource.map(|(kind, _)| kind.to_string()))
        .bind(resource.map(|(_, id)| id.to_string()))
        .bind(detail)
        .bind(&client.ip)
        .bind(&client.user_agent)
        .bind(Utc::now())
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: i64) -> AdminResult<Vec<ActivityEntry>> {
        let rows = sqlx::query(
            "SELECT id, admin_id, action, resource_type, resource_id, detail,
                    ip, user_agent, created_at
             FROM admin_activity_log
             ORDER BY id DESC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ActivityEntry {
                id: row.get("id"),
                admin_id: row.get("admin_id"),
                action: row.get("action"),
                resource_type: row.get("resource_type"),
                resource_id: row.get("resource_id"),
                detail: row.get("detail"),
                ip: row.get("ip"),
                user_agent: row.get("user_agent"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
